use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::models::{Bedrooms, CleaningArea, HomeStyle, RepairItem, ServiceKind};

/// Deterministic price quote for a service selection. A zero `net` means the
/// combination is invalid and the booking must be rejected, never priced as
/// free. GBP throughout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceQuote {
    pub net: Decimal,
    pub vat: Decimal,
    pub gross: Decimal,
}

const VAT_RATE: Decimal = dec!(0.2);
const CLEANING_ADDON: Decimal = dec!(40);

fn cleaning_base(style: HomeStyle, bedrooms: Option<Bedrooms>) -> Decimal {
    let Some(bedrooms) = bedrooms else {
        return Decimal::ZERO;
    };

    match (style, bedrooms) {
        (HomeStyle::Terrace, Bedrooms::Two | Bedrooms::Three) => dec!(69),
        (HomeStyle::Terrace, Bedrooms::Four) => dec!(79),
        (HomeStyle::Terrace, Bedrooms::Five) => dec!(129),

        (HomeStyle::SemiDetached, Bedrooms::Two) => dec!(69),
        (HomeStyle::SemiDetached, Bedrooms::Three) => dec!(79),
        (HomeStyle::SemiDetached, Bedrooms::Four) => dec!(89),
        (HomeStyle::SemiDetached, Bedrooms::Five) => dec!(99),

        (HomeStyle::Detached, Bedrooms::Two) => dec!(79),
        (HomeStyle::Detached, Bedrooms::Three) => dec!(89),
        (HomeStyle::Detached, Bedrooms::Four) => dec!(99),
        (HomeStyle::Detached, Bedrooms::Five) => dec!(119),

        (HomeStyle::Bungalow, Bedrooms::Two) => dec!(79),
        (HomeStyle::Bungalow, Bedrooms::Three) => dec!(89),
        (HomeStyle::Bungalow, Bedrooms::Four) => dec!(99),
        (HomeStyle::Bungalow, Bedrooms::Five) => dec!(109),

        (HomeStyle::TownHouse, Bedrooms::Three) => dec!(129),
        (HomeStyle::TownHouse, Bedrooms::Four) => dec!(139),

        _ => Decimal::ZERO,
    }
}

fn repair_item_price(style: HomeStyle, bedrooms: Option<Bedrooms>) -> Decimal {
    if style == HomeStyle::Bungalow && bedrooms == Some(Bedrooms::Ground) {
        dec!(45)
    } else if style == HomeStyle::TownHouse {
        dec!(85)
    } else {
        dec!(65)
    }
}

pub fn quote(
    service: ServiceKind,
    style: HomeStyle,
    bedrooms: Option<Bedrooms>,
    cleaning_options: &[CleaningArea],
    repair_options: &[RepairItem],
) -> PriceQuote {
    // Town houses only come in 3- and 4-bedroom configurations; anything else
    // is an invalid selection.
    if style == HomeStyle::TownHouse
        && !matches!(bedrooms, Some(Bedrooms::Three) | Some(Bedrooms::Four))
    {
        return PriceQuote {
            net: Decimal::ZERO,
            vat: Decimal::ZERO,
            gross: Decimal::ZERO,
        };
    }

    let mut net = Decimal::ZERO;

    match service {
        ServiceKind::GutterCleaning => {
            net += cleaning_base(style, bedrooms);
            let addons = cleaning_options
                .iter()
                .filter(|o| !matches!(o, CleaningArea::None))
                .count();
            net += Decimal::from(addons as u64) * CLEANING_ADDON;
        }
        ServiceKind::GutterRepair => {
            net += Decimal::from(repair_options.len() as u64)
                * repair_item_price(style, bedrooms);
        }
    }

    let vat = net * VAT_RATE;
    PriceQuote {
        net,
        vat,
        gross: net + vat,
    }
}
