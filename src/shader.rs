//! WGSL generation and the uniform layouts shared with it.
//!
//! Grid dimensions are baked into the source as constants, the physics
//! parameters travel in [`ClothUniforms`]. Three modules are generated:
//!
//! - **shadow**: cloth seen from the light, read-only access to positions
//! - **composite**: cloth seen from the viewer; the vertex shader also runs
//!   the integrator and writes next positions and velocities
//! - **ground**: the floor quad, sampling the shadow targets

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};

use crate::display::DisplayMode;
use crate::grid::Grid;
use crate::integrator::IntegratorParams;

/// Entry points, shared between generation and pipeline creation.
pub const VS_SHADOW: &str = "vs_shadow";
pub const VS_CLOTH: &str = "vs_cloth";
pub const FS_CLOTH: &str = "fs_cloth";
pub const VS_GROUND: &str = "vs_ground";
pub const FS_GROUND: &str = "fs_ground";

/// Depth offset when comparing the ground against the shadow map.
pub const SHADOW_BIAS: f32 = 0.005;

/// Uniforms of both cloth draws. Matches `ClothUniforms` in WGSL.
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct ClothUniforms {
    pub view_proj: [[f32; 4]; 4],
    pub light_dir: [f32; 3],
    pub alpha: f32,
    pub delta_time: f32,
    pub spinning_speed: f32,
    pub spring_strength: f32,
    pub gravity_strength: f32,
}

impl ClothUniforms {
    pub fn new(view_proj: Mat4, light_dir: Vec3, alpha: f32, params: &IntegratorParams) -> Self {
        Self {
            view_proj: view_proj.to_cols_array_2d(),
            light_dir: light_dir.to_array(),
            alpha,
            delta_time: params.delta_time,
            spinning_speed: params.spinning_speed,
            spring_strength: params.spring_strength,
            gravity_strength: params.gravity_strength,
        }
    }
}

/// Uniforms of the ground draw. Matches `GroundUniforms` in WGSL.
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct GroundUniforms {
    pub view_proj: [[f32; 4]; 4],
    pub light_proj: [[f32; 4]; 4],
    pub mode: u32,
    pub _padding: [u32; 3],
}

impl GroundUniforms {
    pub fn new(view_proj: Mat4, light_proj: Mat4, mode: DisplayMode) -> Self {
        Self {
            view_proj: view_proj.to_cols_array_2d(),
            light_proj: light_proj.to_cols_array_2d(),
            mode: mode.as_u32(),
            _padding: [0; 3],
        }
    }
}

/// Declarations and helpers common to both cloth modules: stream decoding,
/// the smoothed normal and the cloth fragment shader.
fn cloth_prelude(grid: &Grid) -> String {
    format!(
        r#"const ROW_LENGTH: u32 = {row_length}u;
const COLUMN_LENGTH: u32 = {column_length}u;

struct ClothUniforms {{
    view_proj: mat4x4<f32>,
    light_dir: vec3<f32>,
    alpha: f32,
    delta_time: f32,
    spinning_speed: f32,
    spring_strength: f32,
    gravity_strength: f32,
}};

struct ClothVaryings {{
    @builtin(position) clip_position: vec4<f32>,
    @location(0) normal: vec3<f32>,
    @location(1) tex_coord: vec2<f32>,
}};

struct StreamRef {{
    x: u32,
    y: u32,
    tex_coord: vec2<f32>,
}};

@group(0) @binding(0)
var<uniform> uniforms: ClothUniforms;

@group(0) @binding(1)
var<storage, read> current_positions: array<vec4<f32>>;

// Six references per cell: two triangles of the quad (x, y)..(x + 1, y + 1)
fn decode_stream(stream_index: u32) -> StreamRef {{
    var x_offsets = array<u32, 6>(0u, 0u, 1u, 1u, 0u, 1u);
    var y_offsets = array<u32, 6>(0u, 1u, 0u, 0u, 1u, 1u);

    let cell = stream_index / 6u;
    let slot = stream_index % 6u;
    let cell_x = cell % ROW_LENGTH;
    let cell_y = cell / ROW_LENGTH;
    let unwrapped_x = cell_x + x_offsets[slot];

    var r: StreamRef;
    r.x = unwrapped_x % ROW_LENGTH;
    r.y = cell_y + y_offsets[slot];
    r.tex_coord = vec2<f32>(
        f32(unwrapped_x) / f32(ROW_LENGTH),
        f32(r.y) / f32(COLUMN_LENGTH)
    );
    return r;
}}

fn vertex_at(x: u32, y: u32) -> vec3<f32> {{
    return current_positions[y * ROW_LENGTH + x].xyz;
}}

fn vertex_normal(x: u32, y: u32) -> vec3<f32> {{
    let me = vertex_at(x, y);
    let left_x = (x + ROW_LENGTH - 1u) % ROW_LENGTH;
    let right_x = (x + 1u) % ROW_LENGTH;
    let to_left = vertex_at(left_x, y) - me;
    let to_right = vertex_at(right_x, y) - me;

    var normal = vec3<f32>(0.0, 0.0, 0.0);
    var triangles = 0u;

    if y > 0u {{
        let to_up = vertex_at(x, y - 1u) - me;
        normal += normalize(cross(to_up, to_left));
        normal += normalize(cross(to_right, to_up));
        triangles += 2u;
    }}
    if y < COLUMN_LENGTH - 1u {{
        let to_down = vertex_at(x, y + 1u) - me;
        normal += normalize(cross(to_left, to_down));
        normal += normalize(cross(to_down, to_right));
        triangles += 2u;
    }}

    return normal / f32(triangles);
}}

@fragment
fn {fs_cloth}(in: ClothVaryings) -> @location(0) vec4<f32> {{
    let light_intensity = min(max(dot(in.normal, normalize(uniforms.light_dir)), 0.0) * 0.5 + 0.4, 1.0);
    return vec4<f32>(light_intensity * in.tex_coord, 0.0, uniforms.alpha);
}}
"#,
        row_length = grid.row_length(),
        column_length = grid.column_length(),
        fs_cloth = FS_CLOTH,
    )
}

/// Cloth as seen from the light. Never writes simulation state.
pub fn shadow_shader(grid: &Grid) -> String {
    let prelude = cloth_prelude(grid);
    format!(
        r#"{prelude}
@vertex
fn {vs_shadow}(@builtin(vertex_index) stream_index: u32) -> ClothVaryings {{
    let r = decode_stream(stream_index);

    var out: ClothVaryings;
    out.clip_position = uniforms.view_proj * vec4<f32>(vertex_at(r.x, r.y), 1.0);
    out.normal = vertex_normal(r.x, r.y);
    out.tex_coord = r.tex_coord;
    return out;
}}
"#,
        vs_shadow = VS_SHADOW,
    )
}

/// Cloth as seen from the viewer. The owning invocation of each vertex
/// advances it into `next_positions`.
pub fn composite_shader(grid: &Grid) -> String {
    let prelude = cloth_prelude(grid);
    format!(
        r#"{prelude}
@group(0) @binding(2)
var<storage, read> rest_positions: array<vec4<f32>>;

@group(0) @binding(3)
var<storage, read> owners: array<u32>;

@group(0) @binding(4)
var<storage, read_write> next_positions: array<vec4<f32>>;

@group(0) @binding(5)
var<storage, read_write> velocities: array<vec4<f32>>;

fn integrate(vertex_index: u32, x: u32, y: u32) {{
    let current = current_positions[vertex_index];

    // Anchor ring: kinematic spin about the vertical axis
    if y == 0u {{
        let alpha = uniforms.delta_time * uniforms.spinning_speed;
        let cs = cos(alpha);
        let sn = sin(alpha);
        let rotation = mat4x4<f32>(
            vec4<f32>(cs, 0.0, -sn, 0.0),
            vec4<f32>(0.0, 1.0, 0.0, 0.0),
            vec4<f32>(sn, 0.0, cs, 0.0),
            vec4<f32>(0.0, 0.0, 0.0, 1.0)
        );
        next_positions[vertex_index] = rotation * current;
        return;
    }}

    var velocity = velocities[vertex_index];
    velocity.y -= uniforms.gravity_strength * uniforms.delta_time;

    for (var delta_y: i32 = -1; delta_y <= 1; delta_y += 1) {{
        if y == COLUMN_LENGTH - 1u && delta_y == 1 {{
            break;
        }}
        for (var delta_x: i32 = -1; delta_x <= 1; delta_x += 1) {{
            if delta_x == 0 && delta_y == 0 {{
                continue;
            }}
            let other_x = u32(i32(x + ROW_LENGTH) + delta_x) % ROW_LENGTH;
            let other_y = u32(i32(y) + delta_y);
            let other_index = other_y * ROW_LENGTH + other_x;

            let wanted_distance = length(rest_positions[vertex_index] - rest_positions[other_index]);
            let position_diff = current.xyz - current_positions[other_index].xyz;
            let delta_len = wanted_distance - length(position_diff);

            velocity += vec4<f32>(
                normalize(position_diff) * delta_len * uniforms.delta_time * uniforms.spring_strength,
                0.0
            );
        }}
    }}

    velocity.y /= 10.0;

    velocities[vertex_index] = velocity;
    next_positions[vertex_index] = current + velocity * uniforms.delta_time;
}}

@vertex
fn {vs_cloth}(@builtin(vertex_index) stream_index: u32) -> ClothVaryings {{
    let r = decode_stream(stream_index);
    let vertex_index = r.y * ROW_LENGTH + r.x;

    var out: ClothVaryings;
    out.clip_position = uniforms.view_proj * vec4<f32>(vertex_at(r.x, r.y), 1.0);
    out.normal = vertex_normal(r.x, r.y);
    out.tex_coord = r.tex_coord;

    if owners[vertex_index] == stream_index {{
        integrate(vertex_index, r.x, r.y);
    }}
    return out;
}}
"#,
        vs_cloth = VS_CLOTH,
    )
}

/// Ground plane, shaded either by the shadow comparison or by the flat
/// color the shadow pass left behind.
pub fn ground_shader() -> String {
    format!(
        r#"const DISPLAY_SHADOW: u32 = {display_shadow}u;
const SHADOW_BIAS: f32 = {shadow_bias};

struct GroundUniforms {{
    view_proj: mat4x4<f32>,
    light_proj: mat4x4<f32>,
    mode: u32,
}};

struct GroundVaryings {{
    @builtin(position) clip_position: vec4<f32>,
    @location(0) light_coords: vec3<f32>,
}};

@group(0) @binding(0)
var<uniform> ground: GroundUniforms;

@group(0) @binding(1)
var shadow_depth: texture_depth_2d;

@group(0) @binding(2)
var shadow_compare: sampler_comparison;

@group(0) @binding(3)
var shadow_color: texture_2d<f32>;

@group(0) @binding(4)
var color_sampler: sampler;

@vertex
fn {vs_ground}(@location(0) position: vec3<f32>) -> GroundVaryings {{
    let light_clip = ground.light_proj * vec4<f32>(position, 1.0);
    let ndc = light_clip.xyz / light_clip.w;

    var out: GroundVaryings;
    out.clip_position = ground.view_proj * vec4<f32>(position, 1.0);
    // NDC y points up, texture v points down
    out.light_coords = vec3<f32>(ndc.x * 0.5 + 0.5, 0.5 - ndc.y * 0.5, ndc.z);
    return out;
}}

@fragment
fn {fs_ground}(in: GroundVaryings) -> @location(0) vec4<f32> {{
    let visibility = textureSampleCompare(shadow_depth, shadow_compare, in.light_coords.xy, in.light_coords.z - SHADOW_BIAS);
    let flat_color = textureSample(shadow_color, color_sampler, in.light_coords.xy);

    if ground.mode == DISPLAY_SHADOW {{
        let shade = 0.35 + 0.65 * visibility;
        return vec4<f32>(shade, shade, shade, 1.0);
    }}
    return vec4<f32>(flat_color.rgb, 1.0);
}}
"#,
        display_shadow = DisplayMode::Shadow.as_u32(),
        shadow_bias = format_f32(SHADOW_BIAS),
        vs_ground = VS_GROUND,
        fs_ground = FS_GROUND,
    )
}

/// Format an f32 so WGSL always parses it as a float literal.
fn format_f32(v: f32) -> String {
    let s = format!("{v}");
    if s.contains('.') || s.contains('e') {
        s
    } else {
        format!("{s}.0")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Validates WGSL code using naga.
    fn validate_wgsl(code: &str) -> Result<(), String> {
        let module = naga::front::wgsl::parse_str(code)
            .map_err(|e| format!("WGSL parse error: {:?}", e))?;

        let mut validator = naga::valid::Validator::new(
            naga::valid::ValidationFlags::all(),
            naga::valid::Capabilities::all(),
        );
        validator
            .validate(&module)
            .map_err(|e| format!("WGSL validation error: {:?}", e))?;

        Ok(())
    }

    #[test]
    fn test_uniform_sizes() {
        assert_eq!(std::mem::size_of::<ClothUniforms>(), 96);
        assert_eq!(std::mem::size_of::<GroundUniforms>(), 144);
    }

    #[test]
    fn test_shadow_shader_valid() {
        let wgsl = shadow_shader(&Grid::new(60, 40));
        assert!(wgsl.contains("const ROW_LENGTH: u32 = 60u;"));
        assert!(wgsl.contains("const COLUMN_LENGTH: u32 = 40u;"));
        assert!(wgsl.contains(VS_SHADOW));
        // Read-only traversal
        assert!(!wgsl.contains("read_write"));

        validate_wgsl(&wgsl).expect("shadow WGSL should be valid");
    }

    #[test]
    fn test_composite_shader_valid() {
        let wgsl = composite_shader(&Grid::new(4, 3));
        assert!(wgsl.contains("const ROW_LENGTH: u32 = 4u;"));
        assert!(wgsl.contains("owners[vertex_index] == stream_index"));
        assert!(wgsl.contains("var<storage, read_write> next_positions"));

        validate_wgsl(&wgsl).expect("composite WGSL should be valid");
    }

    #[test]
    fn test_ground_shader_valid() {
        let wgsl = ground_shader();
        assert!(wgsl.contains("const DISPLAY_SHADOW: u32 = 1u;"));
        assert!(wgsl.contains("const SHADOW_BIAS: f32 = 0.005;"));

        validate_wgsl(&wgsl).expect("ground WGSL should be valid");
    }

    #[test]
    fn test_format_f32_always_float() {
        assert_eq!(format_f32(1.0), "1.0");
        assert_eq!(format_f32(0.25), "0.25");
    }
}
