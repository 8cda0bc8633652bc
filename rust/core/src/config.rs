// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Scan configuration loaded from defaults and environment variables.

use crate::error::{Error, Result};
use crate::units::AngleUnit;
use std::path::PathBuf;

/// Application directory under the per-user data directory
const DATA_SUBDIR: &str = "opening-lite";

/// Type-size snapshot file name
const CACHE_FILE_NAME: &str = "type_sizes.json";

/// Limits and tolerances for one opening scan.
///
/// Lengths are in model units; `length_unit_per_mm` says how many model
/// units make a millimetre (1.0 for mm models, 1/304.8 for feet).
#[derive(Debug, Clone, PartialEq)]
pub struct ScanConfig {
    /// Smallest allowed opening side.
    pub min_side_size: f64,
    /// Largest allowed opening side.
    pub max_side_size: f64,
    /// Padding added on every side of a raw penetration size.
    pub cut_offset: f64,
    /// Maximum angle between run axis and host normal, in degrees.
    pub parallelism_threshold_degrees: f64,
    /// Snap grid for sizes, in millimetres.
    pub snap_grid_mm: f64,
    /// Model units per millimetre.
    pub length_unit_per_mm: f64,
    /// Intersection volumes at or below this are ignored (cubic model units).
    pub volume_tolerance: f64,
    /// Unit used when angles are logged.
    pub angle_display_unit: AngleUnit,
    /// Write the type-size snapshot after every new cache entry.
    pub persist_cache_on_insert: bool,
    /// Snapshot location; `None` keeps the cache in memory only.
    pub cache_path: Option<PathBuf>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            min_side_size: 50.0,
            max_side_size: 2000.0,
            cut_offset: 50.0,
            parallelism_threshold_degrees: 45.0,
            snap_grid_mm: 5.0,
            length_unit_per_mm: 1.0,
            volume_tolerance: 0.005,
            angle_display_unit: AngleUnit::Degrees,
            persist_cache_on_insert: true,
            cache_path: None,
        }
    }
}

impl ScanConfig {
    /// Defaults for a model measured in a different length unit
    ///
    /// Side limits and offset keep their millimetre meaning.
    pub fn for_unit(length_unit_per_mm: f64) -> Self {
        let mm = Self::default();
        Self {
            min_side_size: mm.min_side_size * length_unit_per_mm,
            max_side_size: mm.max_side_size * length_unit_per_mm,
            cut_offset: mm.cut_offset * length_unit_per_mm,
            length_unit_per_mm,
            ..mm
        }
    }

    /// Load configuration from environment variables over the defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`ScanConfig::from_env`] with an injectable variable source.
    ///
    /// Unparseable values fall back to the default.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let number = |key: &str, default: f64| -> f64 {
            lookup(key)
                .and_then(|v| v.trim().parse::<f64>().ok())
                .unwrap_or(default)
        };

        let length_unit_per_mm = number("OPENING_LITE_UNIT_PER_MM", defaults.length_unit_per_mm);
        let scaled = Self::for_unit(length_unit_per_mm);

        Self {
            min_side_size: number("OPENING_LITE_MIN_SIDE", scaled.min_side_size),
            max_side_size: number("OPENING_LITE_MAX_SIDE", scaled.max_side_size),
            cut_offset: number("OPENING_LITE_CUT_OFFSET", scaled.cut_offset),
            parallelism_threshold_degrees: number(
                "OPENING_LITE_PARALLEL_DEGREES",
                defaults.parallelism_threshold_degrees,
            ),
            snap_grid_mm: number("OPENING_LITE_SNAP_GRID_MM", defaults.snap_grid_mm),
            length_unit_per_mm,
            volume_tolerance: number("OPENING_LITE_VOLUME_TOLERANCE", defaults.volume_tolerance),
            angle_display_unit: lookup("OPENING_LITE_ANGLE_UNIT")
                .and_then(|v| AngleUnit::parse(&v))
                .unwrap_or(defaults.angle_display_unit),
            persist_cache_on_insert: lookup("OPENING_LITE_PERSIST_CACHE")
                .and_then(|v| v.trim().parse::<bool>().ok())
                .unwrap_or(defaults.persist_cache_on_insert),
            cache_path: lookup("OPENING_LITE_CACHE_PATH")
                .map(PathBuf::from)
                .or_else(|| default_cache_path(&lookup)),
        }
    }

    /// Reject limits that would make a scan meaningless.
    pub fn validate(&self) -> Result<()> {
        if !positive(self.min_side_size) || !positive(self.max_side_size) {
            return Err(Error::config("side sizes must be positive"));
        }
        if self.min_side_size > self.max_side_size {
            return Err(Error::config(format!(
                "min side {} exceeds max side {}",
                self.min_side_size, self.max_side_size
            )));
        }
        if !non_negative(self.cut_offset) {
            return Err(Error::config("cut offset must not be negative"));
        }
        let threshold = self.parallelism_threshold_degrees;
        if !positive(threshold) || threshold >= 90.0 {
            return Err(Error::config(format!(
                "parallelism threshold {} must be inside (0, 90) degrees",
                self.parallelism_threshold_degrees
            )));
        }
        if !positive(self.snap_grid_mm) || !positive(self.length_unit_per_mm) {
            return Err(Error::config("snap grid and unit scale must be positive"));
        }
        if !non_negative(self.volume_tolerance) {
            return Err(Error::config("volume tolerance must not be negative"));
        }
        Ok(())
    }

    /// Snap grid in model units.
    #[inline]
    pub fn snap_grid(&self) -> f64 {
        self.snap_grid_mm * self.length_unit_per_mm
    }

    /// Convert model units to millimetres.
    #[inline]
    pub fn to_mm(&self, value: f64) -> f64 {
        value / self.length_unit_per_mm
    }

    /// Centroids closer than this merge into one opening.
    ///
    /// `cut_offset + 0.25 * (min_side + max_side)`: a tunable heuristic,
    /// not a physical constant.
    #[inline]
    pub fn merge_distance(&self) -> f64 {
        self.cut_offset + 0.25 * (self.min_side_size + self.max_side_size)
    }
}

#[inline]
fn positive(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

#[inline]
fn non_negative(value: f64) -> bool {
    value.is_finite() && value >= 0.0
}

/// `<data dir>/opening-lite/type_sizes.json` for the current user.
fn default_cache_path<F>(lookup: &F) -> Option<PathBuf>
where
    F: Fn(&str) -> Option<String>,
{
    let data_dir = lookup("OPENING_LITE_DATA_DIR")
        .map(PathBuf::from)
        .or_else(|| lookup("APPDATA").map(PathBuf::from))
        .or_else(|| lookup("XDG_DATA_HOME").map(PathBuf::from))
        .or_else(|| lookup("HOME").map(|home| PathBuf::from(home).join(".local").join("share")))?;
    Some(data_dir.join(DATA_SUBDIR).join(CACHE_FILE_NAME))
}
