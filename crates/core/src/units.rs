//! Physical constants and unit conversions used across the depletion core.
//!
//! Quantities that cross the configuration boundary are typed with `uom`;
//! the numerical kernels work in plain SI `f64` (seconds, watts) and atomic
//! densities in atoms per barn-centimetre.

use uom::si::{
    f64::{Power, Time},
    power::{megawatt, watt},
    time::{day, second},
};

/// Avogadro constant (1/mol).
pub const AVOGADRO: f64 = 6.022_140_76e23;

/// One barn in cm².
pub const BARN: f64 = 1.0e-24;

/// Seconds per day.
pub const SECONDS_PER_DAY: f64 = 86_400.0;

/// Converts a duration in days to a typed [`Time`].
#[must_use]
pub fn days(value: f64) -> Time {
    Time::new::<day>(value)
}

/// Converts a typed [`Time`] to seconds.
#[must_use]
pub fn seconds(time: Time) -> f64 {
    time.get::<second>()
}

/// Converts a power in watts to a typed [`Power`].
#[must_use]
pub fn watts(value: f64) -> Power {
    Power::new::<watt>(value)
}

/// Converts a typed [`Power`] to megawatts.
#[must_use]
pub fn megawatts(power: Power) -> f64 {
    power.get::<megawatt>()
}

/// Mass in kilograms of `density` atoms/(b·cm) of a nuclide with the given
/// atomic weight (g/mol) filling `volume` cm³.
#[must_use]
pub fn mass_kg(density: f64, atomic_weight: f64, volume: f64) -> f64 {
    density / BARN * volume * atomic_weight / AVOGADRO / 1000.0
}

/// Burnup increment (MWd/kgHM) from a power held for `dt` seconds.
#[must_use]
pub fn burnup_increment(power: Power, heavy_metal_kg: f64, dt: f64) -> f64 {
    if heavy_metal_kg <= 0.0 {
        return 0.0;
    }
    megawatts(power) / heavy_metal_kg * dt / SECONDS_PER_DAY
}
