//! Synthetic attribute values. Pure draws from fixed tables and ranges;
//! no I/O, no error paths.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::models::NewCompany;

pub const INDUSTRIES: &[&str] = &[
    "IT",
    "Finance",
    "Healthcare",
    "Education",
    "Manufacturing",
    "Retail",
    "Energy",
];

pub const CATEGORIES: &[&str] = &[
    "Engineering",
    "Marketing",
    "Sales",
    "Design",
    "HR",
    "Support",
];

const COMPANY_STEMS: &[&str] = &[
    "Northwind", "Apex", "Bluewater", "Cobalt", "Driftwood", "Everline", "Fairlight", "Granite",
    "Harbor", "Ironroot", "Juniper", "Kestrel", "Lakeshore", "Meridian", "Nimbus", "Oakfield",
    "Pinnacle", "Quartz", "Redwood", "Silverpine", "Tidewater", "Umber", "Vantage", "Westbrook",
];

const COMPANY_SUFFIXES: &[&str] = &[
    "Labs", "Group", "Systems", "Holdings", "Partners", "Works", "Solutions", "Digital",
    "Logistics", "Industries",
];

const TITLE_LEVELS: &[&str] = &["Junior", "Mid-level", "Senior", "Lead", "Staff", "Principal"];

const TITLE_ROLES: &[&str] = &[
    "Backend Engineer",
    "Frontend Engineer",
    "Data Analyst",
    "Product Designer",
    "QA Engineer",
    "DevOps Engineer",
    "Account Manager",
    "Sales Representative",
    "Recruiter",
    "Support Specialist",
    "Marketing Manager",
    "Project Manager",
];

const CITIES: &[&str] = &[
    "Berlin", "Warsaw", "Kyiv", "Lisbon", "Amsterdam", "Prague", "Vienna", "Dublin", "Oslo",
    "Helsinki", "Madrid", "Zagreb", "Riga", "Tallinn", "Krakow", "Porto", "Ghent", "Lyon",
    "Rotterdam", "Gdansk",
];

const COUNTRIES: &[&str] = &[
    "Germany", "Poland", "Ukraine", "Portugal", "Netherlands", "Czechia", "Austria", "Ireland",
    "Norway", "Finland", "Spain", "Croatia", "Latvia", "Estonia", "France", "Belgium",
];

fn pick<'a>(rng: &mut impl Rng, table: &'a [&'a str]) -> &'a str {
    table.choose(rng).copied().unwrap_or("")
}

pub fn company(rng: &mut impl Rng) -> NewCompany {
    NewCompany {
        name: company_name(rng),
        industry: industry(rng).to_string(),
        country: country(rng).to_string(),
    }
}

pub fn company_name(rng: &mut impl Rng) -> String {
    format!("{} {}", pick(rng, COMPANY_STEMS), pick(rng, COMPANY_SUFFIXES))
}

pub fn industry(rng: &mut impl Rng) -> &'static str {
    pick(rng, INDUSTRIES)
}

pub fn category(rng: &mut impl Rng) -> &'static str {
    pick(rng, CATEGORIES)
}

pub fn country(rng: &mut impl Rng) -> &'static str {
    pick(rng, COUNTRIES)
}

pub fn city(rng: &mut impl Rng) -> &'static str {
    pick(rng, CITIES)
}

pub fn job_title(rng: &mut impl Rng) -> String {
    format!("{} {}", pick(rng, TITLE_LEVELS), pick(rng, TITLE_ROLES))
}

/// 40% of jobs carry no salary at all; otherwise the pair is drawn so that
/// salary_to is strictly above salary_from.
pub fn salary_pair(rng: &mut impl Rng) -> (Option<i64>, Option<i64>) {
    if rng.gen_bool(0.4) {
        return (None, None);
    }
    let from = rng.gen_range(500..=5000);
    let to = from + rng.gen_range(200..=3000);
    (Some(from), Some(to))
}

/// applied 30%, rejected 65%, hired 5%
pub fn application_status(rng: &mut impl Rng) -> &'static str {
    let roll = rng.gen_range(0.0..1.0);
    if roll < 0.30 {
        "applied"
    } else if roll < 0.95 {
        "rejected"
    } else {
        "hired"
    }
}

pub fn user_id(rng: &mut impl Rng) -> i64 {
    rng.gen_range(1..=500_000)
}
