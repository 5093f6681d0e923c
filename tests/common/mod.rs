//! Shared fixtures for the integration tests.
#![allow(dead_code)]

use edm_rs::{
    AlarmLimits, Channel,
    writer::{EdmWriter, FlightSpec},
};

/// Install a test subscriber that only shows warnings.
pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("warn")
        .with_test_writer()
        .try_init();
}

/// Alarm limits with a 400 °F CHT limit.
pub fn limits_cht_400() -> AlarmLimits {
    AlarmLimits {
        cht: 400,
        ..AlarmLimits::default()
    }
}

/// A four-cylinder flight with `n` samples at cruise values.
///
/// `cht1` overrides the CHT1 reading for selected sample indices.
pub fn cruise_flight(id: u16, n: usize, cht1: impl Fn(usize) -> Option<i32>) -> FlightSpec {
    let mut channels = Vec::new();
    channels.extend_from_slice(&Channel::EGT[..4]);
    channels.extend_from_slice(&Channel::CHT[..4]);
    channels.extend_from_slice(&[Channel::Oil, Channel::FuelFlow, Channel::Volts]);
    let mut f = FlightSpec::new(id, &channels);
    for i in 0..n {
        let egt = 1350 + (i % 7) as i32;
        f.push_values(&[
            (Channel::Egt1, egt),
            (Channel::Egt2, egt + 20),
            (Channel::Egt3, egt - 15),
            (Channel::Egt4, egt + 5),
            (Channel::Cht1, cht1(i).unwrap_or(360)),
            (Channel::Cht2, 355),
            (Channel::Cht3, 370),
            (Channel::Cht4, 362),
            (Channel::Oil, 185),
            (Channel::FuelFlow, 98),
            (Channel::FuelUsed, (i / 10) as i32),
            (Channel::Volts, 281),
        ]);
    }
    f
}

/// File with an empty flight followed by flight 7: 100 samples, CHT1 at
/// 410 °F for samples 40 to 42, CHT limit 400 °F.
pub fn scenario_file() -> Vec<u8> {
    let mut writer = EdmWriter::new("N73EDM");
    writer
        .alarms(limits_cht_400())
        .add_flight(FlightSpec::empty(3))
        .add_flight(cruise_flight(7, 100, |i| (40..=42).contains(&i).then_some(410)));
    writer.finish().expect("fixture encodes")
}
