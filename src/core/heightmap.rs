//! Heightmap-Boden: Höhen-Sampling und Boden-Abfrage über ein Graustufenbild.
//!
//! Erkennt automatisch die Bit-Tiefe (8-Bit oder 16-Bit) und normalisiert
//! die Pixelwerte entsprechend. Die Weltgröße wird aus den Pixel-Dimensionen
//! abgeleitet (pixels = map_size + 1), zentriert um den Ursprung.

use std::path::Path;

use anyhow::{bail, Context, Result};
use glam::Vec3;
use image::{ColorType, DynamicImage, GenericImageView};

use super::ground::{GroundHit, GroundQuery, SurfaceFilter};

/// Standard-Höhenskala (normalized_pixel × Faktor = Y-Meter).
pub const DEFAULT_HEIGHT_SCALE: f32 = 255.0;

/// Mindestbetrag der Y-Komponente, ab dem ein Strahl als vertikal gilt.
const VERTICAL_RAY_MIN_Y: f32 = 0.999;

/// Heightmap als Boden-Oberfläche
#[derive(Debug, Clone)]
pub struct Heightmap {
    /// Normalisierte Grauwerte [0.0, 1.0], zeilenweise gespeichert
    pixels: Vec<f32>,
    width: u32,
    height: u32,
    /// Weltkoordinaten-Bereich (min_x, min_z, max_x, max_z)
    world_bounds: WorldBounds,
    /// Y-Meter bei Grauwert 1.0
    height_scale: f32,
    /// Oberflächenebene für den `SurfaceFilter`
    layer: u32,
}

/// Weltkoordinaten-Begrenzungen der Heightmap
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorldBounds {
    /// Minimale X-Koordinate
    pub min_x: f32,
    /// Minimale Z-Koordinate
    pub min_z: f32,
    /// Maximale X-Koordinate
    pub max_x: f32,
    /// Maximale Z-Koordinate
    pub max_z: f32,
}

impl WorldBounds {
    /// Erstellt Bounds aus Map-Größe (zentriert bei 0,0)
    pub fn from_map_size(size: f32) -> Self {
        let half = size / 2.0;
        Self {
            min_x: -half,
            min_z: -half,
            max_x: half,
            max_z: half,
        }
    }
}

impl Heightmap {
    /// Lädt eine Graustufen-Heightmap; die Weltgröße folgt aus den Pixeln
    /// (`max(Breite, Höhe) - 1` Meter, zentriert).
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let image = open_image(path.as_ref())?;
        let (width, height) = image.dimensions();
        let map_size = width.max(height).saturating_sub(1) as f32;
        Self::from_image(&image, WorldBounds::from_map_size(map_size))
    }

    /// Lädt eine Graustufen-Heightmap über einen vorgegebenen Weltbereich.
    pub fn load_with_bounds(path: impl AsRef<Path>, world_bounds: WorldBounds) -> Result<Self> {
        let image = open_image(path.as_ref())?;
        Self::from_image(&image, world_bounds)
    }

    /// Normalisiert die Luminanz je nach Bit-Tiefe auf [0.0, 1.0].
    fn from_image(image: &DynamicImage, world_bounds: WorldBounds) -> Result<Self> {
        let (width, height) = image.dimensions();
        let wide = matches!(
            image.color(),
            ColorType::L16 | ColorType::La16 | ColorType::Rgb16 | ColorType::Rgba16
        );

        let pixels: Vec<f32> = if wide {
            let max = f32::from(u16::MAX);
            image
                .to_luma16()
                .into_raw()
                .into_iter()
                .map(|v| f32::from(v) / max)
                .collect()
        } else {
            let max = f32::from(u8::MAX);
            image
                .to_luma8()
                .into_raw()
                .into_iter()
                .map(|v| f32::from(v) / max)
                .collect()
        };

        log::debug!(
            "Heightmap-Boden {}x{} ({}-Bit) über {:?}",
            width,
            height,
            if wide { 16 } else { 8 },
            world_bounds
        );
        Self::from_normalized(width, height, pixels, world_bounds)
    }

    /// Erstellt eine Heightmap aus bereits normalisierten Grauwerten [0.0, 1.0].
    pub fn from_normalized(
        width: u32,
        height: u32,
        pixels: Vec<f32>,
        world_bounds: WorldBounds,
    ) -> Result<Self> {
        if width < 2 || height < 2 {
            bail!("Heightmap braucht mindestens 2x2 Pixel, erhalten {width}x{height}");
        }
        if pixels.len() != (width as usize) * (height as usize) {
            bail!(
                "Heightmap-Pixelanzahl passt nicht: {} statt {}",
                pixels.len(),
                width as usize * height as usize
            );
        }
        Ok(Self {
            pixels,
            width,
            height,
            world_bounds,
            height_scale: DEFAULT_HEIGHT_SCALE,
            layer: 0,
        })
    }

    /// Setzt die Höhenskala (Y-Meter bei Grauwert 1.0).
    pub fn with_height_scale(mut self, height_scale: f32) -> Self {
        self.height_scale = height_scale;
        self
    }

    /// Setzt die Oberflächenebene für Filterabfragen.
    pub fn with_layer(mut self, layer: u32) -> Self {
        self.layer = layer;
        self
    }

    /// Berechnet die Terrainhöhe für eine X/Z-Position.
    ///
    /// Bikubische Interpolation (4×4 Nachbarpixel), Positionen außerhalb der
    /// Bounds werden auf den Rand geklemmt.
    pub fn sample_height(&self, x: f32, z: f32) -> f32 {
        let (px, pz) = self.world_to_pixel(x, z);
        let height = self.sample_bicubic(px, pz);
        log::trace!(
            "Heightmap-Sample ({:.3}, {:.3}) -> Pixel ({:.3}, {:.3}) -> {:.3}m",
            x,
            z,
            px,
            pz,
            height * self.height_scale
        );
        height * self.height_scale
    }

    /// Oberflächennormale aus zentralen Differenzen über eine Pixelbreite.
    pub fn surface_normal(&self, x: f32, z: f32) -> Vec3 {
        let (step_x, step_z) = self.pixel_size();
        let h_left = self.sample_height(x - step_x, z);
        let h_right = self.sample_height(x + step_x, z);
        let h_back = self.sample_height(x, z - step_z);
        let h_front = self.sample_height(x, z + step_z);

        Vec3::new(
            (h_left - h_right) * step_z,
            2.0 * step_x * step_z,
            (h_back - h_front) * step_x,
        )
        .normalize_or(Vec3::Y)
    }

    /// Weltausdehnung eines Pixels in X und Z.
    fn pixel_size(&self) -> (f32, f32) {
        let b = &self.world_bounds;
        (
            (b.max_x - b.min_x) / (self.width - 1) as f32,
            (b.max_z - b.min_z) / (self.height - 1) as f32,
        )
    }

    fn world_to_pixel(&self, x: f32, z: f32) -> (f32, f32) {
        let b = &self.world_bounds;
        let nx = ((x - b.min_x) / (b.max_x - b.min_x)).clamp(0.0, 1.0);
        let nz = ((z - b.min_z) / (b.max_z - b.min_z)).clamp(0.0, 1.0);
        (nx * (self.width - 1) as f32, nz * (self.height - 1) as f32)
    }

    /// Bikubische Interpolation über ein 4x4-Grid um den Sample-Punkt
    fn sample_bicubic(&self, px: f32, pz: f32) -> f32 {
        let x = px.floor() as i32;
        let z = pz.floor() as i32;
        let fx = px - px.floor();
        let fz = pz - pz.floor();

        let mut values = [[0.0f32; 4]; 4];
        for (j, row) in values.iter_mut().enumerate() {
            for (i, cell) in row.iter_mut().enumerate() {
                let sample_x = (x + i as i32 - 1).clamp(0, self.width as i32 - 1) as u32;
                let sample_z = (z + j as i32 - 1).clamp(0, self.height as i32 - 1) as u32;
                *cell = self.get_grayscale(sample_x, sample_z);
            }
        }

        let cols = values.map(|row| Self::cubic_interpolate(row[0], row[1], row[2], row[3], fx));
        Self::cubic_interpolate(cols[0], cols[1], cols[2], cols[3], fz)
    }

    /// Catmull-Rom-Interpolation zwischen 4 Werten (Kurve läuft von p1 nach p2)
    fn cubic_interpolate(p0: f32, p1: f32, p2: f32, p3: f32, t: f32) -> f32 {
        let t2 = t * t;
        let t3 = t2 * t;

        let a = -0.5 * p0 + 1.5 * p1 - 1.5 * p2 + 0.5 * p3;
        let b = p0 - 2.5 * p1 + 2.0 * p2 - 0.5 * p3;
        let c = -0.5 * p0 + 0.5 * p2;
        let d = p1;

        a * t3 + b * t2 + c * t + d
    }

    fn get_grayscale(&self, x: u32, y: u32) -> f32 {
        self.pixels[(y * self.width + x) as usize]
    }

    /// Gibt die Dimensionen der Heightmap zurück
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Gibt die verwendeten World-Bounds zurück
    pub fn world_bounds(&self) -> &WorldBounds {
        &self.world_bounds
    }
}

impl GroundQuery for Heightmap {
    /// Nur vertikale Strahlen werden beantwortet; schräge Strahlen treffen nie.
    fn raycast(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        filter: SurfaceFilter,
    ) -> Option<GroundHit> {
        if !filter.accepts(self.layer) || direction.y.abs() < VERTICAL_RAY_MIN_Y {
            return None;
        }

        let terrain = self.sample_height(origin.x, origin.z);
        let distance = if direction.y < 0.0 {
            origin.y - terrain
        } else {
            terrain - origin.y
        };
        if !(0.0..=max_distance).contains(&distance) {
            return None;
        }

        Some(GroundHit {
            distance,
            normal: self.surface_normal(origin.x, origin.z),
        })
    }
}

fn open_image(path: &Path) -> Result<DynamicImage> {
    image::open(path).with_context(|| format!("Heightmap nicht lesbar: {}", path.display()))
}
