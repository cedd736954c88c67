//! Fixed registry of municipalities running a RegioIT waste app deployment.

use std::fmt;
use std::str::FromStr;

use crate::ports::AbfallError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// Waste authorities whose deployment is known to abfuhr.
pub enum Municipality {
    /// Abfallwirtschaftsbetrieb Bergisch Gladbach.
    BergischGladbach,
    /// Lindlar.
    Lindlar,
    /// Zweckverband Entsorgung Westfalen.
    Zew,
    /// Dinslaken.
    Dinslaken,
    /// Pinneberg.
    Pinneberg,
    /// Lüdenscheid.
    Luedenscheid,
    /// Bergischer Abfallwirtschaftsverband.
    Bav,
    /// WML.
    Wml,
    /// KRWAF AWG / GEG.
    Krwaf,
    /// Aachen.
    Aachen,
}

impl Municipality {
    /// Every registered municipality, in display order.
    pub const ALL: [Self; 10] = [
        Self::BergischGladbach,
        Self::Lindlar,
        Self::Zew,
        Self::Dinslaken,
        Self::Pinneberg,
        Self::Luedenscheid,
        Self::Bav,
        Self::Wml,
        Self::Krwaf,
        Self::Aachen,
    ];

    /// Registry key, as used in configuration files.
    #[must_use]
    pub fn key(self) -> &'static str {
        match self {
            Self::BergischGladbach => "Bergisch Gladbach",
            Self::Lindlar => "Lindlar",
            Self::Zew => "ZEW",
            Self::Dinslaken => "Dinslaken",
            Self::Pinneberg => "Pinneberg",
            Self::Luedenscheid => "Luedenscheid",
            Self::Bav => "BAV",
            Self::Wml => "WML",
            Self::Krwaf => "KRWAF",
            Self::Aachen => "Aachen",
        }
    }

    /// Base URL of the deployment; endpoint paths are appended verbatim.
    #[must_use]
    pub fn base_url(self) -> &'static str {
        match self {
            Self::BergischGladbach => "http://aw-bgl2-abfallapp.regioit.de/abfall-app-aw-bgl2",
            Self::Lindlar => "https://lindlar-abfallapp.regioit.de/abfall-app-lindlar",
            Self::Zew => "https://zew2-abfallapp.regioit.de/abfall-app-zew2",
            Self::Dinslaken => "https://din-abfallapp.regioit.de/abfall-app-din",
            Self::Pinneberg => "https://pi-abfallapp.regioit.de/abfall-app-pi",
            Self::Luedenscheid => "https://stl-abfallapp.regioit.de/abfall-app-stl",
            Self::Bav => "https://bav-abfallapp.regioit.de/abfall-app-bav",
            Self::Wml => "https://wml2-abfallapp.regioit.de/abfall-app-wml2",
            Self::Krwaf => "https://krwaf-abfallapp.regioit.de/abfall-app-krwaf",
            Self::Aachen => "https://aachen-abfallapp.regioit.de/abfall-app-aachen",
        }
    }
}

impl fmt::Display for Municipality {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.key())
    }
}

impl FromStr for Municipality {
    type Err = AbfallError;

    fn from_str(key: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|municipality| municipality.key() == key)
            .ok_or_else(|| AbfallError::UnknownMunicipality(key.to_owned()))
    }
}

/// Look up the base URL for a municipality key.
///
/// # Errors
///
/// Returns [`AbfallError::UnknownMunicipality`] when the key is not registered.
pub fn resolve(key: &str) -> Result<&'static str, AbfallError> {
    key.parse::<Municipality>().map(Municipality::base_url)
}
