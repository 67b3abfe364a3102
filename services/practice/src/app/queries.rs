//! services/practice/src/app/queries.rs
//!
//! In-memory lookups over the loaded collections: free-text search for
//! patients and appointments, and the appointments that fall on a given day.

use chrono::NaiveDate;
use dental_core::domain::{Incident, Patient};

/// Matches name and email case-insensitively and contact as typed.
pub fn search_patients(patients: &[Patient], term: &str) -> Vec<Patient> {
    let needle = term.to_lowercase();
    patients
        .iter()
        .filter(|p| {
            p.name.to_lowercase().contains(&needle)
                || p.contact.contains(term)
                || p
                    .email
                    .as_deref()
                    .is_some_and(|email| email.to_lowercase().contains(&needle))
        })
        .cloned()
        .collect()
}

/// Matches title, description or the owning patient's name, case-insensitively.
pub fn search_incidents(incidents: &[Incident], patients: &[Patient], term: &str) -> Vec<Incident> {
    let needle = term.to_lowercase();
    incidents
        .iter()
        .filter(|i| {
            mentions(i, &needle)
                || patients
                    .iter()
                    .find(|p| p.id == i.patient_id)
                    .is_some_and(|p| p.name.to_lowercase().contains(&needle))
        })
        .cloned()
        .collect()
}

/// Appointments on `day`, in stored order.
pub fn incidents_on(incidents: &[Incident], day: NaiveDate) -> Vec<Incident> {
    incidents
        .iter()
        .filter(|i| i.appointment_date.date() == day)
        .cloned()
        .collect()
}

/// One patient's appointments matching `term`, newest first.
pub fn patient_history(incidents: &[Incident], patient_id: &str, term: &str) -> Vec<Incident> {
    let needle = term.to_lowercase();
    let mut history: Vec<Incident> = incidents
        .iter()
        .filter(|i| i.patient_id == patient_id && mentions(i, &needle))
        .cloned()
        .collect();
    history.sort_by(|a, b| b.appointment_date.cmp(&a.appointment_date));
    history
}

fn mentions(incident: &Incident, needle: &str) -> bool {
    incident.title.to_lowercase().contains(needle)
        || incident.description.to_lowercase().contains(needle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::seed::{seed_incidents, seed_patients};

    fn ids<T>(items: &[T], id: impl Fn(&T) -> &str) -> Vec<String> {
        items.iter().map(|item| id(item).to_string()).collect()
    }

    #[test]
    fn patient_search_covers_name_contact_and_email() {
        let patients = seed_patients().unwrap();

        let by_name = search_patients(&patients, "jOhN");
        assert_eq!(ids(&by_name, |p| &p.id), vec!["p1", "p3"]);

        let by_contact = search_patients(&patients, "0987");
        assert_eq!(ids(&by_contact, |p| &p.id), vec!["p2"]);

        let by_email = search_patients(&patients, "SARAH@");
        assert_eq!(ids(&by_email, |p| &p.id), vec!["p4"]);

        assert_eq!(search_patients(&patients, "").len(), 5);
        assert!(search_patients(&patients, "nobody").is_empty());
    }

    #[test]
    fn incident_search_includes_patient_name() {
        let (patients, incidents) = (seed_patients().unwrap(), seed_incidents().unwrap());

        let by_title = search_incidents(&incidents, &patients, "cleaning");
        assert_eq!(ids(&by_title, |i| &i.id), vec!["i2", "i5"]);

        let by_patient = search_incidents(&incidents, &patients, "jane");
        assert_eq!(ids(&by_patient, |i| &i.id), vec!["i4"]);

        let by_description = search_incidents(&incidents, &patients, "UPPER MOLAR");
        assert_eq!(ids(&by_description, |i| &i.id), vec!["i1", "i3"]);
    }

    #[test]
    fn day_lookup_ignores_time_of_day() {
        let incidents = seed_incidents().unwrap();

        let day = NaiveDate::from_ymd_opt(2025, 1, 20).unwrap();
        assert_eq!(ids(&incidents_on(&incidents, day), |i| &i.id), vec!["i4"]);

        let empty = NaiveDate::from_ymd_opt(2025, 1, 21).unwrap();
        assert!(incidents_on(&incidents, empty).is_empty());
    }

    #[test]
    fn history_is_newest_first_and_filtered() {
        let incidents = seed_incidents().unwrap();

        let all = patient_history(&incidents, "p1", "");
        assert_eq!(ids(&all, |i| &i.id), vec!["i3", "i1", "i2"]);

        let fillings = patient_history(&incidents, "p1", "filling");
        assert_eq!(ids(&fillings, |i| &i.id), vec!["i3"]);

        assert!(patient_history(&incidents, "p5", "").is_empty());
    }
}
