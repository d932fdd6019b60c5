//! What the ground shows: the flat cloth color seen by the light, or the
//! depth-compared shadow.

/// Display mode toggled from the keyboard.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum DisplayMode {
    /// Ground shows the cloth's color as seen from the light.
    #[default]
    Color,
    /// Ground shows the shadow from the depth comparison.
    Shadow,
}

impl DisplayMode {
    /// The other mode.
    pub fn cycle(self) -> Self {
        match self {
            DisplayMode::Color => DisplayMode::Shadow,
            DisplayMode::Shadow => DisplayMode::Color,
        }
    }

    /// Value of the `mode` field in the ground uniforms.
    pub const fn as_u32(self) -> u32 {
        match self {
            DisplayMode::Color => 0,
            DisplayMode::Shadow => 1,
        }
    }

    /// Whether the shadow pass writes and tests depth in this mode.
    pub fn depth_test(self) -> bool {
        matches!(self, DisplayMode::Shadow)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_color() {
        assert_eq!(DisplayMode::default(), DisplayMode::Color);
        assert!(!DisplayMode::default().depth_test());
    }

    #[test]
    fn test_cycle_toggles() {
        let mode = DisplayMode::Color.cycle();
        assert_eq!(mode, DisplayMode::Shadow);
        assert!(mode.depth_test());
        assert_eq!(mode.cycle(), DisplayMode::Color);
    }

    #[test]
    fn test_uniform_values_distinct() {
        assert_eq!(DisplayMode::Color.as_u32(), 0);
        assert_eq!(DisplayMode::Shadow.as_u32(), 1);
    }
}
