//! Marketing playbook: suggested actions per persona.

use persona_core::PersonaCode;

pub fn recommended_actions(code: PersonaCode) -> &'static [&'static str] {
    match code {
        PersonaCode::Loyal => &[
            "Strengthen rewards and membership",
            "VIP-only benefits",
            "Ask for referrals and reviews",
        ],
        PersonaCode::Browser => &[
            "Cart discount coupon",
            "First-purchase incentive",
            "Recommend bestsellers",
        ],
        PersonaCode::Sniper => &[
            "Restock and limited-quantity alerts",
            "Bundle offers",
            "Reminders timed to the purchase cycle",
        ],
        PersonaCode::Churn => &[
            "Win-back coupon",
            "Churn reason survey",
            "Tailored content and newsletter",
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_three_actions_per_persona() {
        for code in PersonaCode::ALL {
            assert_eq!(recommended_actions(code).len(), 3);
        }
        assert_eq!(recommended_actions(PersonaCode::Churn)[0], "Win-back coupon");
    }
}
