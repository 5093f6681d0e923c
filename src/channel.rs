use core::fmt;

/// A measurement channel recorded by the engine monitor.
///
/// Which channels a flight actually carries is declared by its header flags;
/// where a channel lives inside a data record is defined by the
/// [`FormatSchema`](crate::FormatSchema).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum Channel {
    Egt1,
    Egt2,
    Egt3,
    Egt4,
    Egt5,
    Egt6,
    Tit1,
    Tit2,
    Cht1,
    Cht2,
    Cht3,
    Cht4,
    Cht5,
    Cht6,
    /// Cooling rate as computed by the monitor itself.
    Cld,
    Oil,
    /// Pilot event marker.
    Mark,
    OilPressure,
    Cdt,
    Iat,
    /// Bus voltage, tenths of a volt.
    Volts,
    Oat,
    /// Fuel used, tenths of a fuel unit.
    FuelUsed,
    /// Fuel flow, tenths of a fuel unit per hour.
    FuelFlow,
    Rpm,
    /// Manifold pressure, tenths of inHg.
    Map,
    Hp,
    Carb,
}

impl Channel {
    /// Exhaust gas temperature channels, cylinder order.
    pub const EGT: [Channel; 6] = [
        Channel::Egt1,
        Channel::Egt2,
        Channel::Egt3,
        Channel::Egt4,
        Channel::Egt5,
        Channel::Egt6,
    ];

    /// Cylinder head temperature channels, cylinder order.
    pub const CHT: [Channel; 6] = [
        Channel::Cht1,
        Channel::Cht2,
        Channel::Cht3,
        Channel::Cht4,
        Channel::Cht5,
        Channel::Cht6,
    ];

    /// Short label as printed on the instrument.
    pub fn name(self) -> &'static str {
        match self {
            Channel::Egt1 => "EGT1",
            Channel::Egt2 => "EGT2",
            Channel::Egt3 => "EGT3",
            Channel::Egt4 => "EGT4",
            Channel::Egt5 => "EGT5",
            Channel::Egt6 => "EGT6",
            Channel::Tit1 => "TIT1",
            Channel::Tit2 => "TIT2",
            Channel::Cht1 => "CHT1",
            Channel::Cht2 => "CHT2",
            Channel::Cht3 => "CHT3",
            Channel::Cht4 => "CHT4",
            Channel::Cht5 => "CHT5",
            Channel::Cht6 => "CHT6",
            Channel::Cld => "CLD",
            Channel::Oil => "OIL",
            Channel::Mark => "MARK",
            Channel::OilPressure => "OILP",
            Channel::Cdt => "CDT",
            Channel::Iat => "IAT",
            Channel::Volts => "BAT",
            Channel::Oat => "OAT",
            Channel::FuelUsed => "USD",
            Channel::FuelFlow => "FF",
            Channel::Rpm => "RPM",
            Channel::Map => "MAP",
            Channel::Hp => "HP",
            Channel::Carb => "CARB",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
