/// Maximum point lights uploaded per frame. Must match `MAX_LIGHTS` in the shader.
pub const MAX_LIGHTS: usize = 4;

/// WGSL shader for instanced, lit meshes.
///
/// Point lights use inverse-power falloff (`intensity / d^decay`) with an
/// optional smooth cutoff at `distance`. Shading is Lambert diffuse plus a
/// normalized Blinn-Phong lobe whose sharpness follows roughness.
pub const SCENE_SHADER: &str = r#"
const MAX_LIGHTS: u32 = 4u;
const PI: f32 = 3.14159265;

struct Light {
    position: vec4<f32>,
    // rgb premultiplied by intensity
    color: vec4<f32>,
    // x = cutoff distance (0 = none), y = decay
    params: vec4<f32>,
};

struct Globals {
    view_proj: mat4x4<f32>,
    camera_position: vec4<f32>,
    // x = light count, y = 1 when the target is not sRGB and output must be encoded here
    light_count: vec4<u32>,
    lights: array<Light, 4>,
};

@group(0) @binding(0)
var<uniform> globals: Globals;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
};

struct InstanceInput {
    @location(2) model_0: vec4<f32>,
    @location(3) model_1: vec4<f32>,
    @location(4) model_2: vec4<f32>,
    @location(5) model_3: vec4<f32>,
    @location(6) color: vec4<f32>,
    // x = roughness, y = metalness
    @location(7) material: vec4<f32>,
};

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) world_position: vec3<f32>,
    @location(1) world_normal: vec3<f32>,
    @location(2) color: vec4<f32>,
    @location(3) material: vec4<f32>,
};

@vertex
fn vs_main(vertex: VertexInput, instance: InstanceInput) -> VertexOutput {
    let model = mat4x4<f32>(
        instance.model_0,
        instance.model_1,
        instance.model_2,
        instance.model_3,
    );
    let world_pos = model * vec4<f32>(vertex.position, 1.0);

    var out: VertexOutput;
    out.clip_position = globals.view_proj * world_pos;
    out.world_position = world_pos.xyz;
    out.world_normal = normalize((model * vec4<f32>(vertex.normal, 0.0)).xyz);
    out.color = instance.color;
    out.material = instance.material;
    return out;
}

fn attenuation(dist: f32, cutoff: f32, decay: f32) -> f32 {
    var falloff = 1.0 / max(pow(dist, decay), 0.01);
    if (cutoff > 0.0) {
        let ratio = dist / cutoff;
        let window = clamp(1.0 - ratio * ratio * ratio * ratio, 0.0, 1.0);
        falloff = falloff * window * window;
    }
    return falloff;
}

fn linear_to_srgb(c: vec3<f32>) -> vec3<f32> {
    let x = max(c, vec3<f32>(0.0));
    let low = x * 12.92;
    let high = 1.055 * pow(x, vec3<f32>(1.0 / 2.4)) - 0.055;
    return select(high, low, x <= vec3<f32>(0.0031308));
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let n = normalize(in.world_normal);
    let v = normalize(globals.camera_position.xyz - in.world_position);
    let roughness = in.material.x;
    let metalness = in.material.y;

    let albedo = in.color.rgb;
    let diffuse_color = albedo * (1.0 - metalness);
    let f0 = mix(vec3<f32>(0.04), albedo, metalness);
    let alpha = max(roughness * roughness, 0.05);
    let shininess = 2.0 / (alpha * alpha) - 2.0;

    var radiance = vec3<f32>(0.0);
    let count = min(globals.light_count.x, MAX_LIGHTS);
    for (var i = 0u; i < count; i = i + 1u) {
        let light = globals.lights[i];
        let to_light = light.position.xyz - in.world_position;
        let dist = length(to_light);
        let l = to_light / max(dist, 1e-4);
        let n_dot_l = max(dot(n, l), 0.0);
        if (n_dot_l <= 0.0) {
            continue;
        }
        let irradiance = light.color.rgb * attenuation(dist, light.params.x, light.params.y) * n_dot_l;
        let h = normalize(l + v);
        let spec = pow(max(dot(n, h), 0.0), shininess) * (shininess + 2.0) / (8.0 * PI);
        radiance += irradiance * (diffuse_color / PI + f0 * spec);
    }
    if (globals.light_count.y == 1u) {
        radiance = linear_to_srgb(radiance);
    }
    return vec4<f32>(radiance, in.color.a);
}
"#;
