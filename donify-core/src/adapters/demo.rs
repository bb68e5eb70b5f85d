//! Demo data for demo mode
//!
//! Six campaigns across the fixed categories, a handful of completed
//! donations against them and a few volunteer applications. Dates are
//! relative to today so the demo never looks stale.

use chrono::{Duration, Utc};
use rust_decimal::Decimal;

use crate::domain::campaign::STATUS_ACTIVE;
use crate::domain::donation::generate_transaction_id;
use crate::domain::{Campaign, Donation, PaymentMethod, PaymentStatus, Volunteer, VolunteerStatus};

struct DemoCampaign {
    id: &'static str,
    title: &'static str,
    description: &'static str,
    category: &'static str,
    location: &'static str,
    goal: i64,
    raised: i64,
    days_running: i64,
    days_left: i64,
}

const DEMO_CAMPAIGNS: &[DemoCampaign] = &[
    DemoCampaign {
        id: "11111111-1111-1111-1111-111111111111",
        title: "Books for Rural Schools",
        description: "Stocking libraries in twelve village schools with textbooks and storybooks.",
        category: "Education",
        location: "Rajasthan, India",
        goal: 250_000,
        raised: 182_500,
        days_running: 40,
        days_left: 20,
    },
    DemoCampaign {
        id: "22222222-2222-2222-2222-222222222222",
        title: "Mobile Health Camp",
        description: "Free check-ups and medicines delivered by a travelling clinic every weekend.",
        category: "Healthcare",
        location: "Bihar, India",
        goal: 500_000,
        raised: 126_000,
        days_running: 12,
        days_left: 75,
    },
    DemoCampaign {
        id: "33333333-3333-3333-3333-333333333333",
        title: "Flood Relief Kits",
        description: "Emergency kits with food, water purifiers and blankets for displaced families.",
        category: "Emergency",
        location: "Assam, India",
        goal: 300_000,
        raised: 291_000,
        days_running: 25,
        days_left: 5,
    },
    DemoCampaign {
        id: "44444444-4444-4444-4444-444444444444",
        title: "Plant a Million Trees",
        description: "Community reforestation drive with native saplings along the river banks.",
        category: "Environment",
        location: "Kerala, India",
        goal: 150_000,
        raised: 48_250,
        days_running: 8,
        days_left: 52,
    },
    DemoCampaign {
        id: "55555555-5555-5555-5555-555555555555",
        title: "Clean Water Wells",
        description: "Drilling and maintaining borewells so villages have safe drinking water.",
        category: "Water",
        location: "Odisha, India",
        goal: 400_000,
        raised: 312_400,
        days_running: 60,
        days_left: 30,
    },
    DemoCampaign {
        id: "66666666-6666-6666-6666-666666666666",
        title: "Community Kitchen",
        description: "Hot meals every day for daily-wage workers and their children.",
        category: "Food",
        location: "Mumbai, India",
        goal: 120_000,
        raised: 9_800,
        days_running: 3,
        days_left: 87,
    },
];

/// Generate demo campaigns (all active)
pub fn generate_demo_campaigns() -> Vec<Campaign> {
    let now = Utc::now();
    let today = now.date_naive();

    DEMO_CAMPAIGNS
        .iter()
        .map(|c| Campaign {
            id: c.id.to_string(),
            title: c.title.to_string(),
            description: c.description.to_string(),
            image_url: None,
            goal_amount: Decimal::new(c.goal, 0),
            raised_amount: Some(Decimal::new(c.raised, 0)),
            category: c.category.to_string(),
            location: Some(c.location.to_string()),
            status: Some(STATUS_ACTIVE.to_string()),
            start_date: Some(today - Duration::days(c.days_running)),
            end_date: Some(today + Duration::days(c.days_left)),
            created_by: None,
            created_at: now - Duration::days(c.days_running),
        })
        .collect()
}

/// Generate completed demo donations spread over the demo campaigns
pub fn generate_demo_donations() -> Vec<Donation> {
    let now = Utc::now();
    let donors: [(Option<(&str, &str)>, i64, PaymentMethod); 8] = [
        (Some(("Priya Sharma", "priya@example.com")), 5_000, PaymentMethod::Upi),
        (Some(("Arjun Mehta", "arjun@example.com")), 2_500, PaymentMethod::Card),
        (None, 10_000, PaymentMethod::Card),
        (Some(("Sara Khan", "sara@example.com")), 1_000, PaymentMethod::Paypal),
        (Some(("Priya Sharma", "priya@example.com")), 1_500, PaymentMethod::Upi),
        (Some(("Rahul Verma", "rahul@example.com")), 750, PaymentMethod::Crypto),
        (None, 500, PaymentMethod::Upi),
        (Some(("Meera Iyer", "meera@example.com")), 20_000, PaymentMethod::Card),
    ];

    donors
        .iter()
        .enumerate()
        .map(|(i, (donor, amount, method))| {
            let campaign = &DEMO_CAMPAIGNS[i % DEMO_CAMPAIGNS.len()];
            Donation {
                id: format!("dddddddd-0000-0000-0000-{:012}", i + 1),
                campaign_id: campaign.id.to_string(),
                donor_id: None,
                amount: Decimal::new(*amount, 0),
                payment_method: *method,
                is_anonymous: donor.is_none(),
                is_recurring: false,
                recurring_frequency: None,
                donor_name: donor.map(|(name, _)| name.to_string()),
                donor_email: donor.map(|(_, email)| email.to_string()),
                message: None,
                payment_status: PaymentStatus::Completed,
                transaction_id: Some(generate_transaction_id()),
                created_at: now - Duration::hours(6 * (i as i64 + 1)),
            }
        })
        .collect()
}

/// Generate demo volunteer applications
pub fn generate_demo_volunteers() -> Vec<Volunteer> {
    let now = Utc::now();
    [
        ("Neha Gupta", "neha@example.com", "Teaching", VolunteerStatus::Approved),
        ("Vikram Singh", "vikram@example.com", "Logistics", VolunteerStatus::Pending),
        ("Anita Das", "anita@example.com", "Medical", VolunteerStatus::Pending),
    ]
    .into_iter()
    .enumerate()
    .map(|(i, (name, email, skills, status))| Volunteer {
        id: format!("vvvvvvvv-0000-0000-0000-{:012}", i + 1),
        full_name: name.to_string(),
        email: email.to_string(),
        phone: None,
        skills: Some(skills.to_string()),
        availability: Some("Weekends".to_string()),
        message: None,
        status,
        created_at: now - Duration::days(i as i64 + 1),
    })
    .collect()
}
