use serde::{Deserialize, Serialize};

// Service catalog enumerations. The string forms are both the API values and
// the stored database values.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ServiceKind {
    #[serde(rename = "Gutter Cleaning")]
    GutterCleaning,
    #[serde(rename = "Gutter Repair")]
    GutterRepair,
}

impl ServiceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceKind::GutterCleaning => "Gutter Cleaning",
            ServiceKind::GutterRepair => "Gutter Repair",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Gutter Cleaning" => Some(ServiceKind::GutterCleaning),
            "Gutter Repair" => Some(ServiceKind::GutterRepair),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CleaningArea {
    Garage,
    Conservatory,
    Extension,
    None,
}

impl CleaningArea {
    pub fn as_str(&self) -> &'static str {
        match self {
            CleaningArea::Garage => "Garage",
            CleaningArea::Conservatory => "Conservatory",
            CleaningArea::Extension => "Extension",
            CleaningArea::None => "None",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Garage" => Some(CleaningArea::Garage),
            "Conservatory" => Some(CleaningArea::Conservatory),
            "Extension" => Some(CleaningArea::Extension),
            "None" => Some(CleaningArea::None),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RepairItem {
    #[serde(rename = "Running Outlet")]
    RunningOutlet,
    #[serde(rename = "Union Joint")]
    UnionJoint,
    Corner,
    #[serde(rename = "Gutter Bracket")]
    GutterBracket,
    Downpipe,
    #[serde(rename = "Gutter Length Replacement")]
    GutterLengthReplacement,
}

impl RepairItem {
    pub fn as_str(&self) -> &'static str {
        match self {
            RepairItem::RunningOutlet => "Running Outlet",
            RepairItem::UnionJoint => "Union Joint",
            RepairItem::Corner => "Corner",
            RepairItem::GutterBracket => "Gutter Bracket",
            RepairItem::Downpipe => "Downpipe",
            RepairItem::GutterLengthReplacement => "Gutter Length Replacement",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Running Outlet" => Some(RepairItem::RunningOutlet),
            "Union Joint" => Some(RepairItem::UnionJoint),
            "Corner" => Some(RepairItem::Corner),
            "Gutter Bracket" => Some(RepairItem::GutterBracket),
            "Downpipe" => Some(RepairItem::Downpipe),
            "Gutter Length Replacement" => Some(RepairItem::GutterLengthReplacement),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HomeStyle {
    Terrace,
    #[serde(rename = "Semi-Detached")]
    SemiDetached,
    Detached,
    Bungalow,
    #[serde(rename = "Town House/3 Stories")]
    TownHouse,
}

impl HomeStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            HomeStyle::Terrace => "Terrace",
            HomeStyle::SemiDetached => "Semi-Detached",
            HomeStyle::Detached => "Detached",
            HomeStyle::Bungalow => "Bungalow",
            HomeStyle::TownHouse => "Town House/3 Stories",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Terrace" => Some(HomeStyle::Terrace),
            "Semi-Detached" => Some(HomeStyle::SemiDetached),
            "Detached" => Some(HomeStyle::Detached),
            "Bungalow" => Some(HomeStyle::Bungalow),
            "Town House/3 Stories" => Some(HomeStyle::TownHouse),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Bedrooms {
    #[serde(rename = "2 Bedroom")]
    Two,
    #[serde(rename = "3 Bedroom")]
    Three,
    #[serde(rename = "4 Bedroom")]
    Four,
    #[serde(rename = "5 Bedroom")]
    Five,
    Ground,
}

impl Bedrooms {
    pub fn as_str(&self) -> &'static str {
        match self {
            Bedrooms::Two => "2 Bedroom",
            Bedrooms::Three => "3 Bedroom",
            Bedrooms::Four => "4 Bedroom",
            Bedrooms::Five => "5 Bedroom",
            Bedrooms::Ground => "Ground",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "2 Bedroom" => Some(Bedrooms::Two),
            "3 Bedroom" => Some(Bedrooms::Three),
            "4 Bedroom" => Some(Bedrooms::Four),
            "5 Bedroom" => Some(Bedrooms::Five),
            "Ground" => Some(Bedrooms::Ground),
            _ => None,
        }
    }
}
