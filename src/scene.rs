use anyhow::{anyhow, bail, Context, Result};
use glam::Vec3;
use roxmltree::{Document, Node};
use serde::{Deserialize, Serialize};

/// Highest octahedron subdivision level a scene may request.
pub const MAX_OCTAHEDRON_DETAIL: u32 = 64;
/// Highest sphere segment count along either axis.
pub const MAX_SPHERE_SEGMENTS: u32 = 1024;

/// Scene description shipped with the binary.
pub const DISCO_SCENE_XML: &str = include_str!("../assets/disco.xml");

/// Runtime representation of a scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Scene {
    pub objects: Vec<SceneObject>,
    pub lights: Vec<Light>,
    pub camera: CameraSpec,
    /// Aim point shared by every light whose target is [`LightAim::Orbit`].
    pub light_target: Vec3,
}

impl Scene {
    /// Builds the disco-ball scene from the embedded description.
    pub fn disco() -> Result<Self> {
        Self::from_xml(DISCO_SCENE_XML).context("built-in scene is invalid")
    }

    /// Parses a scene XML document.
    pub fn from_xml(xml: &str) -> Result<Self> {
        let document = Document::parse(xml).context("invalid scene XML")?;
        let root = document.root_element();

        let camera = match root.children().find(|n| n.has_tag_name("camera")) {
            Some(node) => parse_camera(&node)?,
            None => CameraSpec::default(),
        };

        let mut objects: Vec<SceneObject> = Vec::new();
        for node in root.descendants().filter(|n| n.has_tag_name("object")) {
            let object = parse_object(&node)?;
            if objects.iter().any(|o| o.name == object.name) {
                bail!("duplicate object name {:?}", object.name);
            }
            objects.push(object);
        }

        let mut lights: Vec<Light> = Vec::new();
        for node in root.descendants().filter(|n| n.has_tag_name("light")) {
            let light = parse_light(&node)?;
            if lights.iter().any(|l| l.name == light.name) {
                bail!("duplicate light name {:?}", light.name);
            }
            lights.push(light);
        }

        Ok(Self {
            objects,
            lights,
            camera,
            light_target: Vec3::ZERO,
        })
    }

    pub fn object(&self, name: &str) -> Option<&SceneObject> {
        self.objects.iter().find(|o| o.name == name)
    }

    pub fn light(&self, name: &str) -> Option<&Light> {
        self.lights.iter().find(|l| l.name == name)
    }

    pub fn light_mut(&mut self, name: &str) -> Option<&mut Light> {
        self.lights.iter_mut().find(|l| l.name == name)
    }

    /// World-space point the light is aimed at.
    pub fn aim_point(&self, light: &Light) -> Vec3 {
        match light.target {
            LightAim::Origin => Vec3::ZERO,
            LightAim::Orbit => self.light_target,
        }
    }
}

/// Procedural shape of a mesh object.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Geometry {
    Octahedron {
        radius: f32,
        detail: u32,
    },
    Sphere {
        radius: f32,
        width_segments: u32,
        height_segments: u32,
    },
    Plane {
        width: f32,
        height: f32,
    },
}

impl Geometry {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Octahedron { .. } => "octahedron",
            Self::Sphere { .. } => "sphere",
            Self::Plane { .. } => "plane",
        }
    }

    fn parse(text: &str) -> Result<Self> {
        let mut parts = text.split_whitespace();
        let kind = parts.next().ok_or_else(|| anyhow!("geometry is empty"))?;
        let args: Vec<f32> = parts
            .map(|p| {
                p.parse::<f32>()
                    .map_err(|err| anyhow!("bad geometry argument {p:?}: {err}"))
            })
            .collect::<Result<_>>()?;
        let arg = |index: usize, default: f32| args.get(index).copied().unwrap_or(default);

        let geometry = match kind {
            "octahedron" => Self::Octahedron {
                radius: arg(0, 1.0),
                detail: arg(1, 0.0).max(0.0) as u32,
            },
            "sphere" => Self::Sphere {
                radius: arg(0, 1.0),
                width_segments: arg(1, 32.0).max(3.0) as u32,
                height_segments: arg(2, 16.0).max(2.0) as u32,
            },
            "plane" => Self::Plane {
                width: arg(0, 1.0),
                height: arg(1, 1.0),
            },
            other => bail!("unknown geometry {other:?}"),
        };
        match geometry {
            Self::Octahedron { detail, .. } if detail > MAX_OCTAHEDRON_DETAIL => {
                bail!("octahedron detail {detail} exceeds {MAX_OCTAHEDRON_DETAIL}")
            }
            Self::Sphere {
                width_segments,
                height_segments,
                ..
            } if width_segments > MAX_SPHERE_SEGMENTS || height_segments > MAX_SPHERE_SEGMENTS => {
                bail!(
                    "sphere segments {width_segments}x{height_segments} exceed {MAX_SPHERE_SEGMENTS}"
                )
            }
            _ => Ok(geometry),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MaterialKind {
    #[default]
    Standard,
    Physical,
}

/// Surface parameters for the lighting shader.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Material {
    pub kind: MaterialKind,
    pub color: Vec3,
    pub metalness: f32,
    pub roughness: f32,
    pub reflectivity: f32,
    pub clearcoat_roughness: f32,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            kind: MaterialKind::Standard,
            color: Vec3::ONE,
            metalness: 0.0,
            roughness: 1.0,
            reflectivity: 0.5,
            clearcoat_roughness: 0.0,
        }
    }
}

/// Mesh placed in the scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneObject {
    pub name: String,
    pub geometry: Geometry,
    #[serde(default)]
    pub material: Material,
    #[serde(default)]
    pub position: Vec3,
    /// Euler angles in radians, applied in XYZ order.
    #[serde(default)]
    pub rotation: Vec3,
    #[serde(default = "default_scale")]
    pub scale: Vec3,
    /// Radians added to `rotation.y` on every tick.
    #[serde(default)]
    pub spin: f32,
    #[serde(default)]
    pub cast_shadow: bool,
    #[serde(default)]
    pub receive_shadow: bool,
}

fn default_scale() -> Vec3 {
    Vec3::ONE
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum LightKind {
    Ambient,
    Directional,
    Spot {
        /// Cone half-angle in radians.
        angle: f32,
        penumbra: f32,
        /// Zero means unlimited range.
        distance: f32,
        decay: f32,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LightAim {
    #[default]
    Origin,
    Orbit,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Light {
    pub name: String,
    pub kind: LightKind,
    pub color: Vec3,
    pub intensity: f32,
    #[serde(default)]
    pub position: Vec3,
    #[serde(default)]
    pub target: LightAim,
    #[serde(default)]
    pub cast_shadow: bool,
}

/// Perspective camera placement.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraSpec {
    /// Vertical field of view in degrees.
    pub fov: f32,
    pub near: f32,
    pub far: f32,
    pub position: Vec3,
}

impl Default for CameraSpec {
    fn default() -> Self {
        Self {
            fov: 75.0,
            near: 0.1,
            far: 100.0,
            position: Vec3::new(4.0, 2.0, 5.0),
        }
    }
}

fn parse_camera(node: &Node<'_, '_>) -> Result<CameraSpec> {
    let defaults = CameraSpec::default();
    Ok(CameraSpec {
        fov: parse_f32(optional_text(node, "fov"), defaults.fov)?,
        near: parse_f32(optional_text(node, "near"), defaults.near)?,
        far: parse_f32(optional_text(node, "far"), defaults.far)?,
        position: parse_vec3(optional_text(node, "position"), defaults.position)?,
    })
}

fn parse_object(node: &Node<'_, '_>) -> Result<SceneObject> {
    let name = required_text(node, "name")?;
    let geometry = Geometry::parse(&required_text(node, "geometry")?)
        .with_context(|| format!("object {name}"))?;

    let mut material = Material::default();
    material.kind = match optional_text(node, "material").as_deref() {
        None | Some("standard") => MaterialKind::Standard,
        Some("physical") => MaterialKind::Physical,
        Some(other) => bail!("object {name}: unknown material {other:?}"),
    };
    material.color = parse_color(optional_text(node, "color"), material.color)?;
    material.metalness = parse_f32(optional_text(node, "metalness"), material.metalness)?;
    material.roughness = parse_f32(optional_text(node, "roughness"), material.roughness)?;
    material.reflectivity = parse_f32(optional_text(node, "reflectivity"), material.reflectivity)?;
    material.clearcoat_roughness = parse_f32(
        optional_text(node, "clearcoat-roughness"),
        material.clearcoat_roughness,
    )?;

    let rotation_degrees = parse_vec3(optional_text(node, "rotation"), Vec3::ZERO)?;

    Ok(SceneObject {
        geometry,
        material,
        position: parse_vec3(optional_text(node, "position"), Vec3::ZERO)?,
        rotation: Vec3::new(
            rotation_degrees.x.to_radians(),
            rotation_degrees.y.to_radians(),
            rotation_degrees.z.to_radians(),
        ),
        scale: parse_vec3(optional_text(node, "scale"), Vec3::ONE)?,
        spin: parse_f32(optional_text(node, "spin"), 0.0)?,
        cast_shadow: parse_bool(optional_text(node, "cast-shadow"))?,
        receive_shadow: parse_bool(optional_text(node, "receive-shadow"))?,
        name,
    })
}

fn parse_light(node: &Node<'_, '_>) -> Result<Light> {
    let name = required_text(node, "name")?;
    let kind = match required_text(node, "type")?.as_str() {
        "ambient" => LightKind::Ambient,
        "directional" => LightKind::Directional,
        "spot" => LightKind::Spot {
            angle: parse_f32(optional_text(node, "angle"), 60.0)?.to_radians(),
            penumbra: parse_f32(optional_text(node, "penumbra"), 0.0)?,
            distance: parse_f32(optional_text(node, "distance"), 0.0)?,
            decay: parse_f32(optional_text(node, "decay"), 2.0)?,
        },
        other => bail!("light {name}: unknown type {other:?}"),
    };
    let target = match optional_text(node, "target").as_deref() {
        None | Some("origin") => LightAim::Origin,
        Some("orbit") => LightAim::Orbit,
        Some(other) => bail!("light {name}: unknown target {other:?}"),
    };

    Ok(Light {
        kind,
        color: parse_color(optional_text(node, "color"), Vec3::ONE)?,
        intensity: parse_f32(optional_text(node, "intensity"), 1.0)?,
        position: parse_vec3(optional_text(node, "position"), Vec3::ZERO)?,
        target,
        cast_shadow: parse_bool(optional_text(node, "cast-shadow"))?,
        name,
    })
}

fn required_text(node: &Node<'_, '_>, tag: &str) -> Result<String> {
    optional_text(node, tag).ok_or_else(|| anyhow!("<{tag}> tag is missing"))
}

fn optional_text(node: &Node<'_, '_>, tag: &str) -> Option<String> {
    node.children()
        .find(|child| child.has_tag_name(tag))
        .and_then(|child| child.text())
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(|text| text.to_string())
}

fn parse_vec3(value: Option<String>, default: Vec3) -> Result<Vec3> {
    let Some(value) = value else {
        return Ok(default);
    };
    let numbers = value
        .split_whitespace()
        .map(|component| {
            component
                .parse::<f32>()
                .map_err(|err| anyhow!("bad vector component {component:?}: {err}"))
        })
        .collect::<Result<Vec<_>>>()?;
    match numbers.as_slice() {
        [x, y, z] => Ok(Vec3::new(*x, *y, *z)),
        _ => Err(anyhow!("vector needs three components, got {value:?}")),
    }
}

/// Accepts `#rrggbb`, `0xrrggbb` or three 0-255 components.
fn parse_color(value: Option<String>, default: Vec3) -> Result<Vec3> {
    let Some(value) = value else {
        return Ok(default);
    };
    let hex = value
        .strip_prefix('#')
        .or_else(|| value.strip_prefix("0x"));
    if let Some(hex) = hex {
        if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            bail!("hex color {value:?} must have six hex digits");
        }
        let rgb = u32::from_str_radix(hex, 16)
            .map_err(|err| anyhow!("bad hex color {value:?}: {err}"))?;
        let channel = |shift: u32| ((rgb >> shift) & 0xff) as f32 / 255.0;
        return Ok(Vec3::new(channel(16), channel(8), channel(0)));
    }
    let rgb = parse_vec3(Some(value), default).context("color is missing components")?;
    Ok(rgb / 255.0)
}

fn parse_f32(value: Option<String>, default: f32) -> Result<f32> {
    match value {
        Some(value) => value
            .parse::<f32>()
            .map_err(|err| anyhow!("failed to parse float: {err}")),
        None => Ok(default),
    }
}

fn parse_bool(value: Option<String>) -> Result<bool> {
    match value.as_deref() {
        None | Some("false") => Ok(false),
        Some("true") => Ok(true),
        Some(other) => Err(anyhow!("expected true or false, got {other:?}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
    <scene>
        <camera>
            <fov>90</fov>
        </camera>
        <object>
            <name>Ball</name>
            <geometry>octahedron 2 1</geometry>
            <material>physical</material>
            <color>0xff8000</color>
            <rotation>0 90 0</rotation>
            <spin>0.5</spin>
        </object>
        <light>
            <name>Spot</name>
            <type>spot</type>
            <intensity>2.5</intensity>
            <position>0 5 0</position>
            <color>255 128 0</color>
            <target>orbit</target>
        </light>
    </scene>
    "#;

    #[test]
    fn parse_scene_populates_objects_and_lights() {
        let scene = Scene::from_xml(SAMPLE).unwrap();
        assert_eq!(scene.camera.fov, 90.0);
        assert_eq!(scene.camera.position, Vec3::new(4.0, 2.0, 5.0));

        let ball = scene.object("Ball").unwrap();
        assert_eq!(
            ball.geometry,
            Geometry::Octahedron {
                radius: 2.0,
                detail: 1
            }
        );
        assert_eq!(ball.material.kind, MaterialKind::Physical);
        assert_eq!(ball.material.color, Vec3::new(1.0, 128.0 / 255.0, 0.0));
        assert!((ball.rotation.y - std::f32::consts::FRAC_PI_2).abs() < 1e-6);
        assert_eq!(ball.spin, 0.5);

        let light = scene.light("Spot").unwrap();
        assert_eq!(light.position, Vec3::new(0.0, 5.0, 0.0));
        assert!((light.intensity - 2.5).abs() < f32::EPSILON);
        assert_eq!(light.color, Vec3::new(1.0, 128.0 / 255.0, 0.0));
        assert_eq!(light.target, LightAim::Orbit);
        let LightKind::Spot { angle, decay, .. } = light.kind else {
            panic!("expected a spot light");
        };
        assert!((angle - std::f32::consts::FRAC_PI_3).abs() < 1e-6);
        assert_eq!(decay, 2.0);
    }

    #[test]
    fn disco_scene_matches_the_light_show() {
        let scene = Scene::disco().unwrap();
        assert_eq!(scene.objects.len(), 3);
        assert_eq!(scene.lights.len(), 5);

        let ball = scene.object("DiscoBall").unwrap();
        assert_eq!(ball.position, Vec3::new(0.0, 15.0, 0.0));
        assert_eq!(ball.spin, 0.01);
        assert!(ball.cast_shadow);

        let floor = scene.object("Floor").unwrap();
        assert!((floor.rotation.x + std::f32::consts::FRAC_PI_2).abs() < 1e-6);
        assert!(floor.receive_shadow);

        let orbiting = scene
            .lights
            .iter()
            .filter(|l| l.target == LightAim::Orbit)
            .count();
        assert_eq!(orbiting, 3);

        let moon = scene.light("MoonLight").unwrap();
        assert_eq!(moon.kind, LightKind::Directional);
        assert_eq!(moon.position, Vec3::new(4.0, 5.0, -2.0));
    }

    #[test]
    fn aim_point_follows_shared_target() {
        let mut scene = Scene::disco().unwrap();
        scene.light_target = Vec3::splat(3.0);
        let pink = scene.light("PinkLight").unwrap().clone();
        let moon = scene.light("MoonLight").unwrap().clone();
        assert_eq!(scene.aim_point(&pink), Vec3::splat(3.0));
        assert_eq!(scene.aim_point(&moon), Vec3::ZERO);
    }

    #[test]
    fn missing_name_is_an_error() {
        let bad = "<scene><object><geometry>plane 1 1</geometry></object></scene>";
        assert!(Scene::from_xml(bad).is_err());
    }

    #[test]
    fn unknown_geometry_is_an_error() {
        let bad = "<scene><object><name>X</name><geometry>torus 1</geometry></object></scene>";
        assert!(Scene::from_xml(bad).is_err());
    }

    #[test]
    fn short_hex_color_is_rejected() {
        assert!(parse_color(Some("#fff".to_string()), Vec3::ONE).is_err());
    }

    #[test]
    fn signed_hex_color_is_rejected() {
        assert!(parse_color(Some("#+12345".to_string()), Vec3::ONE).is_err());
        assert!(parse_color(Some("0x-12345".to_string()), Vec3::ONE).is_err());
        assert!(parse_color(Some("#a9C388".to_string()), Vec3::ONE).is_ok());
    }

    #[test]
    fn oversized_geometry_is_rejected() {
        let err = Geometry::parse("octahedron 1 100000").unwrap_err();
        assert!(err.to_string().contains("exceeds 64"));
        assert!(Geometry::parse("octahedron 1 64").is_ok());
        assert!(Geometry::parse("sphere 1 2048 16").is_err());
        assert!(Geometry::parse("sphere 1 32 5000").is_err());
        assert!(Geometry::parse("sphere 1 1024 1024").is_ok());
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let objects = "<scene>\
            <object><name>Ball</name><geometry>sphere 1</geometry></object>\
            <object><name>Ball</name><geometry>plane 1 1</geometry></object>\
            </scene>";
        let err = Scene::from_xml(objects).unwrap_err();
        assert!(err.to_string().contains("duplicate object name"));

        let lights = "<scene>\
            <light><name>Lamp</name><type>ambient</type></light>\
            <light><name>Lamp</name><type>directional</type></light>\
            </scene>";
        let err = Scene::from_xml(lights).unwrap_err();
        assert!(err.to_string().contains("duplicate light name"));
    }
}
