use serde::{Deserialize, Serialize};

use crate::error::SceneError;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct PlanetDescriptor {
    pub key: u32,
    pub name: String,
    pub texture: String,
    pub bump_map: String,
    pub x: f32,
    pub radius: f32,
}

impl PlanetDescriptor {
    fn earth() -> Self {
        PlanetDescriptor {
            key: 3,
            name: "earth".to_string(),
            texture: "assets/textures/earthmap1k.jpg".to_string(),
            bump_map: "assets/textures/earthbump1k.jpg".to_string(),
            x: 0.0,
            radius: 3.0,
        }
    }
}

/// Geographic anchor in degrees.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct GeoAnchor {
    pub lat: f32,
    pub lon: f32,
}

impl Default for GeoAnchor {
    fn default() -> Self {
        // New Delhi
        GeoAnchor { lat: 28.6139, lon: 77.2090 }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct CameraConfig {
    pub fov_deg: f32,
    pub near: f32,
    pub far: f32,
    pub position: [f32; 3],
}

impl Default for CameraConfig {
    fn default() -> Self {
        CameraConfig {
            fov_deg: 70.0,
            near: 0.1,
            far: 2000.0,
            position: [0.0, 6.0, 10.0],
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct SceneConfig {
    pub planets: Vec<PlanetDescriptor>,
    pub anchor: GeoAnchor,
    pub anchor_radius: f32,
    pub label_text: String,
    pub label_class: String,
    pub galaxy_texture: String,
    pub particle_texture: String,
    pub particle_count: usize,
    pub particle_extent: f32,
    pub particle_size: f32,
    pub particle_offset_x: f32,
    /// The particle cloud is built either way; this only controls drawing.
    pub show_particles: bool,
    pub show_anchor_marker: bool,
    pub backdrop_radius: f32,
    /// Radians added to each backdrop axis per frame.
    pub backdrop_spin: f32,
    pub ambient_intensity: f32,
    pub camera: CameraConfig,
    pub damping_factor: f32,
}

impl Default for SceneConfig {
    fn default() -> Self {
        SceneConfig {
            planets: vec![PlanetDescriptor::earth()],
            anchor: GeoAnchor::default(),
            anchor_radius: 1.0,
            label_text: "Hello".to_string(),
            label_class: "action-btns".to_string(),
            galaxy_texture: "assets/textures/galaxy.png".to_string(),
            particle_texture: "assets/textures/circle_05.png".to_string(),
            particle_count: 20_000,
            particle_extent: 10.0,
            particle_size: 0.1,
            particle_offset_x: -3.0,
            show_particles: false,
            show_anchor_marker: false,
            backdrop_radius: 80.0,
            backdrop_spin: 0.0001,
            ambient_intensity: 2.0,
            camera: CameraConfig::default(),
            damping_factor: 0.05,
        }
    }
}

impl SceneConfig {
    pub fn from_json(text: &str) -> Result<Self, SceneError> {
        Ok(serde_json::from_str(text)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_scene() {
        let config = SceneConfig::default();
        assert_eq!(config.planets.len(), 1);
        assert_eq!(config.planets[0].name, "earth");
        assert_eq!(config.planets[0].radius, 3.0);
        assert_eq!(config.camera.fov_deg, 70.0);
        assert_eq!(config.camera.near, 0.1);
        assert_eq!(config.particle_count, 20_000);
        assert!(!config.show_particles);
        assert!(!config.show_anchor_marker);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config = SceneConfig::from_json(r#"{ "show_particles": true, "label_text": "Delhi" }"#).unwrap();
        assert!(config.show_particles);
        assert_eq!(config.label_text, "Delhi");
        assert_eq!(config.backdrop_radius, 80.0);
        assert_eq!(config.planets, SceneConfig::default().planets);
    }

    #[test]
    fn planets_can_be_replaced() {
        let json = r#"{
            "planets": [
                { "key": 1, "name": "mars", "texture": "m.jpg", "bump_map": "mb.jpg", "x": 4.0, "radius": 1.5 }
            ],
            "camera": { "fov_deg": 45.0 }
        }"#;
        let config = SceneConfig::from_json(json).unwrap();
        assert_eq!(config.planets[0].name, "mars");
        assert_eq!(config.camera.fov_deg, 45.0);
        assert_eq!(config.camera.position, [0.0, 6.0, 10.0]);
    }

    #[test]
    fn malformed_json_is_a_config_error() {
        let err = SceneConfig::from_json("{ nope").unwrap_err();
        assert!(matches!(err, SceneError::Config(_)));
    }
}
