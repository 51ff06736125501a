use sbyec_answer::{Extractor, Intent};
use sbyec_core::config::OrgProfile;
use sbyec_core::types::Passage;

fn extractor() -> Extractor {
    Extractor::new(OrgProfile::default(), 5).unwrap()
}

fn passages(texts: &[&str]) -> Vec<Passage> {
    texts.iter().enumerate().map(|(i, t)| Passage::new(format!("p:{}", i), *t)).collect()
}

#[test]
fn contact_returns_phone_then_email() {
    let ps = passages(&["Contact us! PHONE: (564) 208-1315 EMAIL: info@silverbuckleranch.org"]);
    let m = extractor().extract("What's your phone number?", &ps).unwrap();
    assert_eq!(m.intent, Intent::Contact);
    assert_eq!(m.answer, "Phone: (564) 208-1315\nEmail: info@silverbuckleranch.org");
}

#[test]
fn email_lists_up_to_three_unique() {
    let ps = passages(&["a@x.org b@x.org", "a@x.org c@x.org d@x.org"]);
    let m = extractor().extract("email?", &ps).unwrap();
    assert_eq!(m.intent, Intent::Email);
    assert_eq!(m.answer, "Email: a@x.org, b@x.org, c@x.org");
}

#[test]
fn address_prefers_structured_match() {
    let ps = passages(&["We are at 11611 NE 152nd Avenue, Brush Prairie, WA 98606."]);
    let m = extractor().extract("What is your address", &ps).unwrap();
    assert_eq!(m.answer, "Address: 11611 NE 152nd Avenue, Brush Prairie, WA 98606");
}

#[test]
fn address_falls_back_to_known_street_number() {
    let ps = passages(&["The barn at 11611 is open daily"]);
    let m = extractor().extract("Where are you located?", &ps).unwrap();
    assert_eq!(m.intent, Intent::Address);
    assert_eq!(m.answer, "Address: 11611 NE 152nd Avenue, Brush Prairie, WA 98606");
}

#[test]
fn events_return_first_marked_passage_trimmed() {
    let ps = passages(&["Our horses are lovely.", "  Peppermints and Ponies, 12/13  ", "Upcoming: Halloween"]);
    let m = extractor().extract("What's happening this month?", &ps).unwrap();
    assert_eq!(m.intent, Intent::Events);
    assert_eq!(m.answer, "Peppermints and Ponies, 12/13");
}

#[test]
fn pricing_needs_a_dollar_amount() {
    let ps = passages(&["Lessons for all ages.", "Private lessons are $65 per session."]);
    let m = extractor().extract("How much does it cost?", &ps).unwrap();
    assert_eq!(m.intent, Intent::Pricing);
    assert_eq!(m.answer, "Private lessons are $65 per session.");

    // A bare "$" is not a price; with no other rule firing the generic rule
    // answers with the short top passage only if it is long enough.
    let ps = passages(&["Donations in $ welcome"]);
    assert_eq!(extractor().extract("What is the price?", &ps), None);
}

#[test]
fn team_titles_are_case_sensitive() {
    let ps = passages(&["our manager is great", "Jane Doe, Barn Manager"]);
    let m = extractor().extract("Who is on your team?", &ps).unwrap();
    assert_eq!(m.intent, Intent::Team);
    assert_eq!(m.answer, "Jane Doe, Barn Manager");
}

#[test]
fn lessons_match_case_insensitively() {
    let ps = passages(&["Boarding info.", "RIDING sessions on weekends"]);
    let m = extractor().extract("Do you offer a class?", &ps).unwrap();
    assert_eq!(m.intent, Intent::Lessons);
    assert_eq!(m.answer, "RIDING sessions on weekends");
}

#[test]
fn programs_return_top_passage_unconditionally() {
    let ps = passages(&["short", "anything else"]);
    let m = extractor().extract("Tell me about camp", &ps).unwrap();
    assert_eq!(m.intent, Intent::Programs);
    assert_eq!(m.answer, "short");
}

#[test]
fn generic_requires_substantive_top_passage() {
    let long = "x".repeat(51);
    let m = extractor().extract("Tell me about the horses", &passages(&[&long])).unwrap();
    assert_eq!(m.intent, Intent::Generic);
    assert_eq!(extractor().extract("Tell me about the horses", &passages(&[&"x".repeat(50)])), None);
    assert_eq!(extractor().extract("Tell me about the horses", &[]), None);
}

#[test]
fn failed_rule_falls_through_to_later_rules() {
    // "number" fires the contact rule, which finds nothing; pricing then answers.
    let ps = passages(&["Fee is $20 per rider"]);
    let m = extractor().extract("What number do I pay, what's the fee?", &ps).unwrap();
    assert_eq!(m.intent, Intent::Pricing);
}

#[test]
fn only_top_five_passages_are_considered() {
    let mut texts = vec!["nothing relevant"; 10];
    texts[5] = "PHONE: (564) 208-1315";
    assert_eq!(extractor().extract("phone?", &passages(&texts)), None);
}

#[test]
fn rule_table_is_in_priority_order() {
    let order: Vec<Intent> = extractor().rules().iter().map(|r| r.intent).collect();
    assert_eq!(
        order,
        vec![
            Intent::Contact,
            Intent::Email,
            Intent::Address,
            Intent::Events,
            Intent::Pricing,
            Intent::Team,
            Intent::Lessons,
            Intent::Programs,
            Intent::Generic
        ]
    );
}
