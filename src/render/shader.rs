pub(crate) const SHADER: &str = r#"
struct SpotLight {
    position: vec4<f32>,
    direction: vec4<f32>,
    color: vec4<f32>,
    cone: vec4<f32>,
}

struct GlobalUniform {
    view_proj: mat4x4<f32>,
    camera_position: vec4<f32>,
    ambient: vec4<f32>,
    directional_direction: vec4<f32>,
    directional_color: vec4<f32>,
    spot_count: vec4<u32>,
    spots: array<SpotLight, 4>,
}

struct ObjectConstants {
    model: mat4x4<f32>,
    normal: mat3x4<f32>,
    color: vec4<f32>,
    material: vec4<f32>,
}

@group(0) @binding(0)
var<uniform> globals: GlobalUniform;

@group(1) @binding(0)
var<uniform> object: ObjectConstants;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
}

struct VertexOutput {
    @builtin(position) position: vec4<f32>,
    @location(0) world_pos: vec3<f32>,
    @location(1) normal: vec3<f32>,
}

@vertex
fn vs_main(input: VertexInput) -> VertexOutput {
    var out: VertexOutput;
    let world_position = object.model * vec4<f32>(input.position, 1.0);
    out.position = globals.view_proj * world_position;
    out.world_pos = world_position.xyz;

    let world_normal = mat3x3<f32>(
        object.normal[0].xyz,
        object.normal[1].xyz,
        object.normal[2].xyz
    ) * input.normal;

    out.normal = normalize(world_normal);
    return out;
}

// Lambert diffuse plus Blinn-Phong specular for one light.
fn shade(light_dir: vec3<f32>, radiance: vec3<f32>, normal: vec3<f32>, view_dir: vec3<f32>) -> vec3<f32> {
    let base = object.color.rgb;
    let metalness = clamp(object.material.x, 0.0, 1.0);
    let roughness = clamp(object.material.y, 0.04, 1.0);
    let reflectivity = clamp(object.material.z, 0.0, 1.0);

    let n_dot_l = max(dot(normal, light_dir), 0.0);
    let diffuse = base * (1.0 - metalness) * n_dot_l;

    let half_dir = normalize(light_dir + view_dir);
    let shininess = max(2.0 / pow(roughness, 4.0) - 2.0, 1.0);
    let f0 = mix(vec3<f32>(0.16 * reflectivity * reflectivity), base, metalness);
    let specular = f0 * pow(max(dot(normal, half_dir), 0.0), shininess) * n_dot_l;

    return (diffuse + specular) * radiance;
}

fn spot_contribution(light: SpotLight, world_pos: vec3<f32>, normal: vec3<f32>, view_dir: vec3<f32>) -> vec3<f32> {
    let to_light = light.position.xyz - world_pos;
    let distance = length(to_light);
    let light_dir = to_light / max(distance, 1e-4);

    let angle_cos = dot(light.direction.xyz, -light_dir);
    let outer = light.cone.x;
    let inner = light.cone.y;
    var cone = step(outer, angle_cos);
    if (inner - outer > 1e-4) {
        cone = smoothstep(outer, inner, angle_cos);
    }

    var attenuation = 1.0;
    let range = light.position.w;
    let decay = light.direction.w;
    if (range > 0.0 && decay > 0.0) {
        attenuation = pow(clamp(1.0 - distance / range, 0.0, 1.0), decay);
    }

    let radiance = light.color.rgb * light.color.w * cone * attenuation;
    return shade(light_dir, radiance, normal, view_dir);
}

@fragment
fn fs_main(input: VertexOutput, @builtin(front_facing) front_facing: bool) -> @location(0) vec4<f32> {
    var normal = normalize(input.normal);
    if (!front_facing) {
        normal = -normal;
    }
    let view_dir = normalize(globals.camera_position.xyz - input.world_pos);
    let metalness = clamp(object.material.x, 0.0, 1.0);

    var color = object.color.rgb * (1.0 - metalness) * globals.ambient.rgb;
    color += shade(
        globals.directional_direction.xyz,
        globals.directional_color.rgb,
        normal,
        view_dir
    );

    let count = min(globals.spot_count.x, 4u);
    for (var i = 0u; i < count; i++) {
        color += spot_contribution(globals.spots[i], input.world_pos, normal, view_dir);
    }

    return vec4<f32>(color, object.color.a);
}
"#;
