use directories::UserDirs;
use glam::{Vec2, Vec3};
use log::{info, warn};
use serde::{Deserialize, Deserializer};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::error::ProfileError;
use crate::gesture::{
    DEFAULT_MIN_CLUSTER_SEPARATION_CM, DEFAULT_MIN_POINTS_DISTANCE_CM,
    DEFAULT_SCREEN_TRANSFORM_THRESHOLD_CM, GestureConfig, GestureKind, TransformGesture,
};
use crate::projection::{OrthographicProjector, Plane, PlaneSpace};
use crate::tracker::RawMapping;
use crate::transform::TransformType;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Meta {
    pub name: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KindName {
    #[default]
    Screen,
    Clustered,
    Pinned,
    #[serde(rename = "clustered_pinned")]
    ClusteredPinned,
}

impl KindName {
    fn is_pinned(self) -> bool {
        matches!(self, KindName::Pinned | KindName::ClusteredPinned)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GestureSettings {
    pub kind: KindName,
    #[serde(deserialize_with = "deserialize_types")]
    pub types: TransformType,
    pub min_pointers: usize,
    pub max_pointers: usize,
    /// Pinned kinds only.
    pub pivot: Vec3,
}

impl Default for GestureSettings {
    fn default() -> Self {
        Self {
            kind: KindName::Screen,
            types: TransformType::ALL,
            min_pointers: 0,
            max_pointers: 0,
            pivot: Vec3::ZERO,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    pub screen_transform_cm: f32,
    pub min_points_distance_cm: f32,
    pub min_cluster_separation_cm: f32,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            screen_transform_cm: DEFAULT_SCREEN_TRANSFORM_THRESHOLD_CM,
            min_points_distance_cm: DEFAULT_MIN_POINTS_DISTANCE_CM,
            min_cluster_separation_cm: DEFAULT_MIN_CLUSTER_SEPARATION_CM,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DisplaySettings {
    pub dpi: f32,
    /// Raw device range `[min, max]` per axis; contacts are pixels when unset.
    pub raw_x: Option<[f32; 2]>,
    pub raw_y: Option<[f32; 2]>,
    /// Screen size in pixels the raw range maps onto.
    pub size: Option<[f32; 2]>,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            dpi: crate::accumulator::DEFAULT_DPI,
            raw_x: None,
            raw_y: None,
            size: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectionMode {
    #[default]
    Screen,
    Plane,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProjectionSettings {
    pub mode: ProjectionMode,
    pub plane_origin: Vec3,
    pub plane_normal: Vec3,
    /// Screen pixel over the world origin.
    pub screen_origin: Vec2,
    pub units_per_pixel: f32,
}

impl Default for ProjectionSettings {
    fn default() -> Self {
        Self {
            mode: ProjectionMode::Screen,
            plane_origin: Vec3::ZERO,
            plane_normal: Vec3::Z,
            screen_origin: Vec2::ZERO,
            units_per_pixel: 1.0,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Profile {
    #[serde(default)]
    pub meta: Meta,
    #[serde(default)]
    pub gesture: GestureSettings,
    #[serde(default)]
    pub thresholds: Thresholds,
    #[serde(default)]
    pub display: DisplaySettings,
    #[serde(default)]
    pub projection: ProjectionSettings,
}

// Accept either "translation|rotation" or ["translation", "rotation"]
fn deserialize_types<'de, D>(de: D) -> std::result::Result<TransformType, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    let names: Vec<String> = match toml::Value::deserialize(de)? {
        toml::Value::String(s) => s.split(['|', ',']).map(str::to_string).collect(),
        toml::Value::Array(items) => {
            let mut names = Vec::with_capacity(items.len());
            for v in items {
                match v {
                    toml::Value::String(s) => names.push(s),
                    other => {
                        return Err(D::Error::custom(format!(
                            "transform type must be a string, got {}",
                            other.type_str()
                        )));
                    }
                }
            }
            names
        }
        other => {
            return Err(D::Error::custom(format!(
                "types must be a string or an array, got {}",
                other.type_str()
            )));
        }
    };

    let mut types = TransformType::NONE;
    for name in names.iter().map(|n| n.trim()).filter(|n| !n.is_empty()) {
        if name.eq_ignore_ascii_case("all") {
            types |= TransformType::ALL;
            continue;
        }
        types |= TransformType::from_name(name).ok_or_else(|| {
            D::Error::custom(format!(
                "unknown transform type '{name}' (expected translation, rotation, scaling or all)"
            ))
        })?;
    }
    Ok(types)
}

fn builtin_profile_text() -> &'static str {
    include_str!("../profiles/default.toml")
}

impl Profile {
    /// The profile shipped with the binary.
    pub fn builtin() -> Result<Self, ProfileError> {
        Self::parse(builtin_profile_text(), "<built-in default>")
    }

    /// Parses and validates profile text. `origin` names it in errors.
    pub fn parse(text: &str, origin: &str) -> Result<Self, ProfileError> {
        let profile: Profile = toml::from_str(text).map_err(|source| ProfileError::Parse {
            origin: origin.to_string(),
            source,
        })?;
        profile.validate()?;
        Ok(profile)
    }

    pub fn load(path: &Path) -> Result<Self, ProfileError> {
        if !path.exists() {
            return Err(ProfileError::NotFound(path.to_path_buf()));
        }
        let text = fs::read_to_string(path).map_err(|source| ProfileError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text, &path.display().to_string())
    }

    pub fn name(&self) -> &str {
        self.meta.name.as_deref().unwrap_or("unnamed")
    }

    pub fn validate(&self) -> Result<(), ProfileError> {
        let d = &self.display;
        if !(d.dpi.is_finite() && d.dpi > 0.0) {
            return Err(ProfileError::invalid("display.dpi must be a positive number"));
        }

        let t = &self.thresholds;
        for (name, value) in [
            ("screen_transform_cm", t.screen_transform_cm),
            ("min_points_distance_cm", t.min_points_distance_cm),
            ("min_cluster_separation_cm", t.min_cluster_separation_cm),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(ProfileError::invalid(format!(
                    "thresholds.{name} must be zero or positive"
                )));
            }
        }

        let g = &self.gesture;
        if g.types.is_empty() {
            return Err(ProfileError::invalid("gesture.types enables nothing"));
        }
        if g.kind.is_pinned() {
            if g.types.without(TransformType::TRANSLATION).is_empty() {
                return Err(ProfileError::invalid(
                    "pinned gestures need rotation or scaling in gesture.types",
                ));
            }
            if g.types.contains(TransformType::TRANSLATION) {
                warn!("pinned gestures never translate; ignoring 'translation' in gesture.types");
            }
        }
        if g.min_pointers > 0 && g.max_pointers > 0 && g.max_pointers < g.min_pointers {
            return Err(ProfileError::invalid(format!(
                "gesture.max_pointers ({}) is below gesture.min_pointers ({})",
                g.max_pointers, g.min_pointers
            )));
        }

        match (d.raw_x, d.raw_y, d.size) {
            (None, None, None) => {}
            (Some(x), Some(y), Some(size)) => {
                if x[1] <= x[0] || y[1] <= y[0] {
                    return Err(ProfileError::invalid(
                        "display raw ranges must be [min, max] with max > min",
                    ));
                }
                if size[0] <= 0.0 || size[1] <= 0.0 {
                    return Err(ProfileError::invalid("display.size must be positive"));
                }
            }
            _ => {
                return Err(ProfileError::invalid(
                    "display.raw_x, display.raw_y and display.size go together",
                ));
            }
        }

        let p = &self.projection;
        if p.mode == ProjectionMode::Plane {
            if p.plane_normal.length_squared() < f32::EPSILON {
                return Err(ProfileError::invalid("projection.plane_normal must not be zero"));
            }
            if !(p.units_per_pixel.is_finite() && p.units_per_pixel > 0.0) {
                return Err(ProfileError::invalid("projection.units_per_pixel must be positive"));
            }
        }
        Ok(())
    }

    pub fn gesture_config(&self) -> GestureConfig {
        let kind = match self.gesture.kind {
            KindName::Screen => GestureKind::Screen,
            KindName::Clustered => GestureKind::Clustered,
            KindName::Pinned => GestureKind::Pinned {
                pivot: self.gesture.pivot,
            },
            KindName::ClusteredPinned => GestureKind::ClusteredPinned {
                pivot: self.gesture.pivot,
            },
        };
        GestureConfig {
            kind,
            types: self.gesture.types,
            min_pointers: self.gesture.min_pointers,
            max_pointers: self.gesture.max_pointers,
            dpi: self.display.dpi,
            screen_transform_threshold_cm: self.thresholds.screen_transform_cm,
            min_points_distance_cm: self.thresholds.min_points_distance_cm,
            min_cluster_separation_cm: self.thresholds.min_cluster_separation_cm,
        }
    }

    /// A gesture with the math this profile's projection asks for.
    pub fn build_gesture(&self) -> TransformGesture {
        let config = self.gesture_config();
        match self.projection.mode {
            ProjectionMode::Screen => TransformGesture::new(config),
            ProjectionMode::Plane => {
                let p = &self.projection;
                let projector = OrthographicProjector {
                    screen_origin: p.screen_origin,
                    units_per_pixel: p.units_per_pixel,
                };
                let plane = Plane::new(p.plane_origin, p.plane_normal);
                TransformGesture::with_math(config, Box::new(PlaneSpace::new(projector, plane)))
            }
        }
    }

    pub fn raw_mapping(&self) -> Option<RawMapping> {
        let d = &self.display;
        match (d.raw_x, d.raw_y, d.size) {
            (Some(x), Some(y), Some(size)) => {
                Some(RawMapping::new(x[0], x[1], y[0], y[1], Vec2::from(size)))
            }
            _ => None,
        }
    }
}

/// Profiles on disk plus a pointer file naming the active one.
#[derive(Debug, Clone)]
pub struct ProfileStore {
    profiles_dir: PathBuf,
    active_ptr: PathBuf,
}

impl ProfileStore {
    /// `~/.config/touchxform`.
    pub fn open() -> Result<Self, ProfileError> {
        let home = UserDirs::new()
            .ok_or(ProfileError::NoConfigDir)?
            .home_dir()
            .to_path_buf();
        Ok(Self::at(home.join(".config").join("touchxform")))
    }

    pub fn at(config_dir: PathBuf) -> Self {
        Self {
            profiles_dir: config_dir.join("profiles"),
            active_ptr: config_dir.join("active"),
        }
    }

    pub fn profiles_dir(&self) -> &Path {
        &self.profiles_dir
    }

    pub fn profile_path(&self, name: &str) -> PathBuf {
        self.profiles_dir.join(format!("{name}.toml"))
    }

    /// Writes the built-in default profile and active pointer if missing.
    pub fn install_default(&self) -> Result<(), ProfileError> {
        fs::create_dir_all(&self.profiles_dir).map_err(|source| ProfileError::Write {
            path: self.profiles_dir.clone(),
            source,
        })?;

        let def_path = self.profile_path("default");
        if !def_path.exists() {
            fs::write(&def_path, builtin_profile_text()).map_err(|source| ProfileError::Write {
                path: def_path.clone(),
                source,
            })?;
            info!("installed default profile at {}", def_path.display());
        }

        if !self.active_ptr.exists() {
            fs::write(&self.active_ptr, b"default").map_err(|source| ProfileError::Write {
                path: self.active_ptr.clone(),
                source,
            })?;
        }
        Ok(())
    }

    pub fn active_name(&self) -> Result<String, ProfileError> {
        let name = fs::read_to_string(&self.active_ptr).map_err(|source| ProfileError::Read {
            path: self.active_ptr.clone(),
            source,
        })?;
        Ok(name.trim().to_string())
    }

    pub fn set_active(&self, name: &str) -> Result<(), ProfileError> {
        // parse before switching so a broken profile never becomes active
        self.load(name)?;
        fs::write(&self.active_ptr, name.as_bytes()).map_err(|source| ProfileError::Write {
            path: self.active_ptr.clone(),
            source,
        })
    }

    pub fn load(&self, name: &str) -> Result<Profile, ProfileError> {
        Profile::load(&self.profile_path(name))
    }

    pub fn load_active(&self) -> Result<Profile, ProfileError> {
        self.load(&self.active_name()?)
    }

    pub fn list(&self) -> Vec<String> {
        let mut v = Vec::new();
        if let Ok(rd) = fs::read_dir(&self.profiles_dir) {
            for e in rd.flatten() {
                let path = e.path();
                if path.extension().is_some_and(|ext| ext == "toml") {
                    if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                        v.push(stem.to_string());
                    }
                }
            }
        }
        v.sort();
        v
    }
}
