//! Social media management price calculator
//!
//! Subscriptions are priced from a frequency x term table. Add-ons are
//! monthly rates scaled by the number of months in the term.

use super::{custom_override, money};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Posting cadence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostingFrequency {
    ThreePerWeek,
    FivePerWeek,
    Daily,
}

impl PostingFrequency {
    /// Undiscounted monthly rate
    pub fn monthly_rate(&self) -> Decimal {
        match self {
            PostingFrequency::ThreePerWeek => dec!(300),
            PostingFrequency::FivePerWeek => dec!(450),
            PostingFrequency::Daily => dec!(600),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PostingFrequency::ThreePerWeek => "3 posts per week",
            PostingFrequency::FivePerWeek => "5 posts per week",
            PostingFrequency::Daily => "Daily posts",
        }
    }
}

/// Subscription term
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionTerm {
    Monthly,
    SemiAnnual,
    Annual,
}

impl SubscriptionTerm {
    pub fn months(&self) -> u32 {
        match self {
            SubscriptionTerm::Monthly => 1,
            SubscriptionTerm::SemiAnnual => 6,
            SubscriptionTerm::Annual => 12,
        }
    }
}

/// Monthly add-on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SocialAddon {
    StoryPosts,
    AdManagement,
    AnalyticsReport,
}

impl SocialAddon {
    pub fn monthly_price(&self) -> Decimal {
        match self {
            SocialAddon::StoryPosts => dec!(50),
            SocialAddon::AdManagement => dec!(150),
            SocialAddon::AnalyticsReport => dec!(40),
        }
    }
}

/// Subscription price for a frequency and term
pub fn subscription_price(frequency: PostingFrequency, term: SubscriptionTerm) -> Decimal {
    use PostingFrequency::*;
    use SubscriptionTerm::*;

    match (frequency, term) {
        (ThreePerWeek, Monthly) => dec!(300),
        (ThreePerWeek, SemiAnnual) => dec!(1620),
        (ThreePerWeek, Annual) => dec!(3060),
        (FivePerWeek, Monthly) => dec!(450),
        (FivePerWeek, SemiAnnual) => dec!(2430),
        (FivePerWeek, Annual) => dec!(4590),
        (Daily, Monthly) => dec!(600),
        (Daily, SemiAnnual) => dec!(3240),
        (Daily, Annual) => dec!(6120),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SocialQuote {
    pub months: u32,
    pub subscription_price: Decimal,
    pub addons_price: Decimal,
    pub total_price: Decimal,
    pub monthly_equivalent: Decimal,
    pub savings: Decimal,
    pub breakdown: Vec<String>,
}

/// Calculate the price of a social media subscription
pub fn calculate_social_price(
    frequency: PostingFrequency,
    subscription: SubscriptionTerm,
    addons: &[SocialAddon],
    custom_price: Option<Decimal>,
) -> SocialQuote {
    let months = subscription.months();
    let months_dec = Decimal::from(months);

    if let Some(price) = custom_override(custom_price) {
        return SocialQuote {
            months,
            subscription_price: price,
            addons_price: Decimal::ZERO,
            total_price: price,
            monthly_equivalent: money(price / months_dec),
            savings: Decimal::ZERO,
            breakdown: vec![format!("Custom price: ${:.2}", price)],
        };
    }

    let subscription_price = subscription_price(frequency, subscription);
    let addons_price: Decimal =
        addons.iter().map(SocialAddon::monthly_price).sum::<Decimal>() * months_dec;
    let total_price = subscription_price + addons_price;
    let savings = frequency.monthly_rate() * months_dec - subscription_price;

    let mut breakdown = vec![format!(
        "{} for {} month{}: ${:.2}",
        frequency.label(),
        months,
        if months == 1 { "" } else { "s" },
        subscription_price
    )];
    if !addons_price.is_zero() {
        breakdown.push(format!("Add-ons: ${:.2}", addons_price));
    }
    if savings > Decimal::ZERO {
        breakdown.push(format!("You save: ${:.2}", savings));
    }

    SocialQuote {
        months,
        subscription_price,
        addons_price,
        total_price,
        monthly_equivalent: money(total_price / months_dec),
        savings,
        breakdown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_monthly_has_no_savings() {
        let quote =
            calculate_social_price(PostingFrequency::Daily, SubscriptionTerm::Monthly, &[], None);
        assert_eq!(quote.total_price, dec!(600));
        assert_eq!(quote.savings, dec!(0));
        assert_eq!(quote.monthly_equivalent, dec!(600));
    }

    #[test]
    fn test_annual_with_addons() {
        let quote = calculate_social_price(
            PostingFrequency::ThreePerWeek,
            SubscriptionTerm::Annual,
            &[SocialAddon::StoryPosts, SocialAddon::AnalyticsReport],
            None,
        );
        assert_eq!(quote.subscription_price, dec!(3060));
        assert_eq!(quote.addons_price, dec!(1080));
        assert_eq!(quote.total_price, dec!(4140));
        assert_eq!(quote.monthly_equivalent, dec!(345));
        assert_eq!(quote.savings, dec!(540));
    }

    #[test]
    fn test_semi_annual_savings() {
        let quote = calculate_social_price(
            PostingFrequency::FivePerWeek,
            SubscriptionTerm::SemiAnnual,
            &[],
            None,
        );
        assert_eq!(quote.savings, dec!(270));
        assert_eq!(quote.monthly_equivalent, dec!(405));
    }

    #[test]
    fn test_custom_price_skips_addons() {
        let quote = calculate_social_price(
            PostingFrequency::Daily,
            SubscriptionTerm::Annual,
            &[SocialAddon::AdManagement],
            Some(dec!(5000)),
        );
        assert_eq!(quote.total_price, dec!(5000));
        assert_eq!(quote.addons_price, dec!(0));
        assert_eq!(quote.monthly_equivalent, dec!(416.67));
    }
}
