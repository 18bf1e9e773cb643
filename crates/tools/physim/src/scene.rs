//! Scene files: physics settings, a tile grid and the bodies to simulate
//!
//! ```toml
//! [physics]
//! tile_size = 128.0
//!
//! [grid]
//! width = 8
//! height = 2
//! walls = [[5, 0], [5, 1]]
//!
//! [[body]]
//! name = "runner"
//! shape = "cylinder"
//! radius = 20.0
//! height = 40.0
//! position = [64.0, 64.0, 0.0]
//! velocity = [60.0, 0.0, 0.0]
//! ```

use anyhow::{bail, ensure, Context, Result};
use ember_physics::{Body, BodyHandle, Bumper, CollisionBits, PhysicsConfig, PhysicsWorld};
use glam::Vec3;
use serde::Deserialize;
use std::path::Path;

use crate::grid::TileGrid;

/// Largest grid a scene may declare, in tiles
pub const MAX_GRID_TILES: u32 = 1 << 20;

#[derive(Debug, Clone, Deserialize)]
pub struct Scene {
    #[serde(default)]
    pub physics: PhysicsConfig,
    pub grid: GridSpec,
    #[serde(default, rename = "body")]
    pub bodies: Vec<BodySpec>,
}

/// Grid size in tiles plus the special tiles, as `[x, y]` pairs
#[derive(Debug, Clone, Deserialize)]
pub struct GridSpec {
    pub width: u32,
    pub height: u32,
    #[serde(default)]
    pub walls: Vec<[u32; 2]>,
    #[serde(default)]
    pub water: Vec<[u32; 2]>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Shape {
    Cylinder,
    Square,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BodySpec {
    pub name: String,
    #[serde(default = "default_shape")]
    pub shape: Shape,
    /// Radius for cylinders, half side for squares
    pub radius: f32,
    pub height: f32,
    pub position: Vec3,
    #[serde(default)]
    pub velocity: Vec3,
    #[serde(default = "default_inverse_mass")]
    pub inverse_mass: f32,
    #[serde(default)]
    pub platform: bool,
    #[serde(default = "default_stopped_by")]
    pub stopped_by: CollisionBits,
}

fn default_shape() -> Shape {
    Shape::Cylinder
}

fn default_inverse_mass() -> f32 {
    1.0
}

fn default_stopped_by() -> CollisionBits {
    CollisionBits::CHARACTER
}

impl BodySpec {
    pub fn bumper(&self) -> Bumper {
        match self.shape {
            Shape::Cylinder => Bumper::cylinder(self.radius, self.height),
            Shape::Square => Bumper::square(self.radius, self.height),
        }
    }

    pub fn to_body(&self) -> Body {
        let body = if self.platform {
            Body::platform(self.bumper(), self.position)
        } else {
            Body::new(self.bumper(), self.position).with_inverse_mass(self.inverse_mass)
        };
        body.with_velocity(self.velocity)
            .with_stopped_by(self.stopped_by)
    }
}

impl Scene {
    /// Parse and validate a scene from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let scene: Scene = toml::from_str(content).context("Failed to parse scene")?;
        scene.validate()?;
        Ok(scene)
    }

    /// Load a scene file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read scene {}", path.display()))?;
        Self::from_toml_str(&content).with_context(|| format!("Invalid scene {}", path.display()))
    }

    pub fn validate(&self) -> Result<()> {
        self.physics
            .validate()
            .context("Invalid [physics] settings")?;

        ensure!(
            self.grid.width > 0 && self.grid.height > 0,
            "grid must be at least one tile wide and high"
        );
        ensure!(
            self.grid
                .width
                .checked_mul(self.grid.height)
                .is_some_and(|tiles| tiles <= MAX_GRID_TILES),
            "{}x{} grid exceeds the {MAX_GRID_TILES} tile limit",
            self.grid.width,
            self.grid.height
        );
        for &[x, y] in self.grid.walls.iter().chain(&self.grid.water) {
            ensure!(
                x < self.grid.width && y < self.grid.height,
                "tile [{x}, {y}] lies outside the {}x{} grid",
                self.grid.width,
                self.grid.height
            );
        }

        for (i, body) in self.bodies.iter().enumerate() {
            if body.name.is_empty() {
                bail!("body #{i} has no name");
            }
            if self.bodies[..i].iter().any(|other| other.name == body.name) {
                bail!("duplicate body name '{}'", body.name);
            }
            ensure!(
                body.radius > 0.0 && body.height > 0.0,
                "body '{}' needs a positive radius and height",
                body.name
            );
            ensure!(
                body.position.is_finite() && body.velocity.is_finite(),
                "body '{}' has a non-finite position or velocity",
                body.name
            );
            ensure!(
                body.inverse_mass >= 0.0,
                "body '{}' has a negative inverse mass",
                body.name
            );
        }

        Ok(())
    }

    pub fn build_grid(&self) -> TileGrid {
        let mut grid = TileGrid::new(self.grid.width, self.grid.height, self.physics.tile_size);
        for &[x, y] in &self.grid.walls {
            grid.mark(x, y, CollisionBits::WALL);
        }
        for &[x, y] in &self.grid.water {
            grid.mark(x, y, CollisionBits::WATER);
        }
        grid
    }

    /// Create the world and return each body's handle alongside its name
    pub fn build_world(&self) -> (PhysicsWorld, Vec<(BodyHandle, String)>) {
        let mut world = PhysicsWorld::new(self.physics.clone());
        let names = self
            .bodies
            .iter()
            .map(|spec| (world.insert(spec.to_body()), spec.name.clone()))
            .collect();
        (world, names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CORRIDOR: &str = r#"
        [physics]
        tile_size = 100.0
        platform_tolerance = 25.0

        [grid]
        width = 6
        height = 2
        walls = [[4, 0], [4, 1]]

        [[body]]
        name = "runner"
        radius = 20.0
        height = 40.0
        position = [50.0, 50.0, 0.0]
        velocity = [30.0, 0.0, 0.0]

        [[body]]
        name = "crate"
        shape = "square"
        radius = 30.0
        height = 30.0
        position = [250.0, 50.0, 0.0]
        platform = true
    "#;

    #[test]
    fn test_parse_scene() {
        let scene = Scene::from_toml_str(CORRIDOR).unwrap();
        assert_eq!(scene.physics.tile_size, 100.0);
        assert_eq!(scene.physics.breadcrumb_capacity, 32);
        assert_eq!(scene.bodies.len(), 2);
        assert_eq!(scene.bodies[0].shape, Shape::Cylinder);
        assert_eq!(scene.bodies[0].stopped_by, CollisionBits::CHARACTER);
        assert_eq!(scene.bodies[1].bumper(), Bumper::square(30.0, 30.0));
    }

    #[test]
    fn test_build_world() {
        let scene = Scene::from_toml_str(CORRIDOR).unwrap();
        let (world, names) = scene.build_world();
        assert_eq!(world.bodies().len(), 2);

        let (crate_handle, name) = &names[1];
        assert_eq!(name, "crate");
        let body = world.get(*crate_handle).unwrap();
        assert!(body.is_platform);
        assert!(body.is_immovable());
        assert_eq!(world.config().platform_tolerance, 25.0);
    }

    #[test]
    fn test_build_grid() {
        use ember_physics::MapQuery;

        let scene = Scene::from_toml_str(CORRIDOR).unwrap();
        let grid = scene.build_grid();
        assert!(grid.is_blocked(Vec3::new(450.0, 50.0, 0.0), 1.0, CollisionBits::WALL));
        assert!(!grid.is_blocked(Vec3::new(350.0, 50.0, 0.0), 1.0, CollisionBits::WALL));
    }

    #[test]
    fn test_rejects_tile_outside_grid() {
        let text = CORRIDOR.replace("[4, 1]", "[9, 1]");
        assert!(Scene::from_toml_str(&text).is_err());
    }

    #[test]
    fn test_rejects_huge_grid() {
        let text = CORRIDOR
            .replace("width = 6", "width = 65536")
            .replace("height = 2", "height = 65536");
        let err = Scene::from_toml_str(&text).unwrap_err();
        assert!(err.to_string().contains("tile limit"));

        let text = CORRIDOR.replace("width = 6", "width = 4294967295");
        assert!(Scene::from_toml_str(&text).is_err());
    }

    #[test]
    fn test_rejects_duplicate_names() {
        let text = CORRIDOR.replace("\"crate\"", "\"runner\"");
        let err = Scene::from_toml_str(&text).unwrap_err();
        assert!(err.to_string().contains("duplicate"));
    }

    #[test]
    fn test_rejects_bad_physics() {
        let text = CORRIDOR.replace("tile_size = 100.0", "tile_size = -1.0");
        assert!(Scene::from_toml_str(&text).is_err());
    }

    #[test]
    fn test_missing_grid_is_parse_error() {
        assert!(Scene::from_toml_str("[[body]]\nname = \"x\"").is_err());
    }
}
