//! Fullscreen blit of the engine frame onto the window surface.
//!
//! The engine renders on the CPU into an RGBA image. Each frame that image
//! is uploaded to a texture and drawn with a single fullscreen triangle.
//! While a resize is being debounced the frame and the surface disagree in
//! size; the frame is then drawn at its own pixel size from the top-left
//! corner and the rest is filled with the background color.

use bytemuck::{Pod, Zeroable};

/// Format of the uploaded frame. The canvas stores sRGB-encoded bytes.
pub const FRAME_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;

/// Uniforms for the blit pass.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct BlitUniforms {
    /// Frame size divided by surface size, per axis.
    pub scale: [f32; 2],
    pub _padding: [f32; 2],
    /// Linear RGBA shown outside the frame.
    pub background: [f32; 4],
}

impl BlitUniforms {
    pub fn new(frame: (u32, u32), surface: (u32, u32), background: glam::Vec3) -> Self {
        let axis = |f: u32, s: u32| {
            if s == 0 {
                1.0
            } else {
                (f as f32 / s as f32).max(1e-3)
            }
        };
        Self {
            scale: [axis(frame.0, surface.0), axis(frame.1, surface.1)],
            _padding: [0.0; 2],
            background: [background.x, background.y, background.z, 1.0],
        }
    }
}

pub const BLIT_SHADER: &str = r#"
struct BlitUniforms {
    scale: vec2<f32>,
    _padding: vec2<f32>,
    background: vec4<f32>,
};

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) uv: vec2<f32>,
};

@group(0) @binding(0)
var frame: texture_2d<f32>;
@group(0) @binding(1)
var frame_sampler: sampler;
@group(0) @binding(2)
var<uniform> blit: BlitUniforms;

@vertex
fn vs_main(@builtin(vertex_index) vertex_index: u32) -> VertexOutput {
    var positions = array<vec2<f32>, 3>(
        vec2<f32>(-1.0, -1.0),
        vec2<f32>(3.0, -1.0),
        vec2<f32>(-1.0, 3.0),
    );
    var uvs = array<vec2<f32>, 3>(
        vec2<f32>(0.0, 1.0),
        vec2<f32>(2.0, 1.0),
        vec2<f32>(0.0, -1.0),
    );

    var out: VertexOutput;
    out.clip_position = vec4<f32>(positions[vertex_index], 0.0, 1.0);
    out.uv = uvs[vertex_index];
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let uv = in.uv / blit.scale;
    let color = textureSample(frame, frame_sampler, uv);
    if (uv.x > 1.0 || uv.y > 1.0) {
        return blit.background;
    }
    return vec4<f32>(color.rgb, 1.0);
}
"#;

#[cfg(test)]
mod tests {
    use super::*;

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
    fn test_blit_shader_validates() {
        validate_wgsl(BLIT_SHADER).unwrap();
    }

    #[test]
    fn test_uniform_layout() {
        assert_eq!(std::mem::size_of::<BlitUniforms>(), 32);
    }

    #[test]
    fn test_scale_matches_sizes() {
        let u = BlitUniforms::new((400, 300), (800, 300), glam::Vec3::ZERO);
        assert_eq!(u.scale, [0.5, 1.0]);
        assert_eq!(u.background[3], 1.0);

        let degenerate = BlitUniforms::new((0, 10), (0, 10), glam::Vec3::ZERO);
        assert_eq!(degenerate.scale, [1.0, 1.0]);
        let empty_frame = BlitUniforms::new((0, 10), (10, 10), glam::Vec3::ZERO);
        assert!(empty_frame.scale[0] > 0.0);
    }
}
