//! WGSL sources for the three pipelines.

/// Uniform block shared by the plane and particle pipelines.
const UNIFORMS: &str = r#"
struct Uniforms {
    view_proj: mat4x4<f32>,
    color: vec4<f32>,
    plane_extent: vec2<f32>,
    particle_size: f32,
    plane_opacity: f32,
};

@group(0) @binding(0)
var<uniform> uniforms: Uniforms;
"#;

const PARTICLE_BODY: &str = r#"
struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) uv: vec2<f32>,
    @location(1) alpha: f32,
};

@vertex
fn vs_main(
    @builtin(vertex_index) vertex_index: u32,
    @location(0) particle_pos: vec3<f32>,
    @location(1) alpha: f32,
) -> VertexOutput {
    var quad_vertices = array<vec2<f32>, 6>(
        vec2<f32>(-1.0, -1.0),
        vec2<f32>( 1.0, -1.0),
        vec2<f32>(-1.0,  1.0),
        vec2<f32>(-1.0,  1.0),
        vec2<f32>( 1.0, -1.0),
        vec2<f32>( 1.0,  1.0),
    );
    let quad_pos = quad_vertices[vertex_index];

    var clip_pos = uniforms.view_proj * vec4<f32>(particle_pos, 1.0);
    clip_pos.x += quad_pos.x * uniforms.particle_size * clip_pos.w;
    clip_pos.y += quad_pos.y * uniforms.particle_size * clip_pos.w;

    var out: VertexOutput;
    out.clip_position = clip_pos;
    out.uv = quad_pos;
    out.alpha = alpha;
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let dist = length(in.uv);
    if in.alpha <= 0.0 || dist > 1.0 {
        discard;
    }
    let falloff = 1.0 - smoothstep(0.5, 1.0, dist);
    return vec4<f32>(uniforms.color.rgb, in.alpha * falloff);
}
"#;

const PLANE_BODY: &str = r#"
@vertex
fn vs_main(
    @builtin(vertex_index) vertex_index: u32,
    @location(0) plane_z: f32,
) -> @builtin(position) vec4<f32> {
    var corners = array<vec2<f32>, 6>(
        vec2<f32>(-1.0, -1.0),
        vec2<f32>( 1.0, -1.0),
        vec2<f32>(-1.0,  1.0),
        vec2<f32>(-1.0,  1.0),
        vec2<f32>( 1.0, -1.0),
        vec2<f32>( 1.0,  1.0),
    );
    let corner = corners[vertex_index] * uniforms.plane_extent;
    return uniforms.view_proj * vec4<f32>(corner, plane_z, 1.0);
}

@fragment
fn fs_main() -> @location(0) vec4<f32> {
    return vec4<f32>(uniforms.color.rgb, uniforms.plane_opacity);
}
"#;

/// Full-screen triangle showing the flat-view image.
pub const FLAT_SOURCE: &str = r#"
@group(0) @binding(0)
var grid_texture: texture_2d<f32>;
@group(0) @binding(1)
var grid_sampler: sampler;

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) uv: vec2<f32>,
};

@vertex
fn vs_main(@builtin(vertex_index) vertex_index: u32) -> VertexOutput {
    let x = f32(i32(vertex_index & 1u) * 4 - 1);
    let y = f32(i32(vertex_index >> 1u) * 4 - 1);

    var out: VertexOutput;
    out.clip_position = vec4<f32>(x, y, 0.0, 1.0);
    out.uv = vec2<f32>((x + 1.0) * 0.5, (1.0 - y) * 0.5);
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    return textureSample(grid_texture, grid_sampler, in.uv);
}
"#;

pub fn particle_source() -> String {
    format!("{UNIFORMS}{PARTICLE_BODY}")
}

pub fn plane_source() -> String {
    format!("{UNIFORMS}{PLANE_BODY}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validate(src: &str) {
        let module = naga::front::wgsl::parse_str(src).unwrap_or_else(|e| panic!("{}", e.emit_to_string(src)));
        naga::valid::Validator::new(naga::valid::ValidationFlags::all(), naga::valid::Capabilities::all())
            .validate(&module)
            .expect("shader failed validation");
    }

    #[test]
    fn particle_shader_is_valid() {
        validate(&particle_source());
    }

    #[test]
    fn plane_shader_is_valid() {
        validate(&plane_source());
    }

    #[test]
    fn flat_shader_is_valid() {
        validate(FLAT_SOURCE);
    }
}
