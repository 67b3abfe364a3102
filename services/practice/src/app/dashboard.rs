//! services/practice/src/app/dashboard.rs
//!
//! Aggregates shown on the dashboards. The admin view gets upcoming
//! appointments, treatment counts, revenue and the highest-spending patients;
//! a patient gets their own upcoming visits, treatments and history.

use chrono::NaiveDateTime;
use dental_core::domain::{Incident, IncidentStatus, Patient};
use serde::Serialize;

pub const UPCOMING_LIMIT: usize = 10;
pub const TOP_PATIENTS_LIMIT: usize = 5;
pub const PATIENT_UPCOMING_LIMIT: usize = 2;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientSpend {
    pub patient: Patient,
    pub appointment_count: usize,
    pub total_spent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub upcoming: Vec<Incident>,
    pub completed_treatments: usize,
    pub pending_treatments: usize,
    pub total_revenue: f64,
    pub top_patients: Vec<PatientSpend>,
}

pub fn summarize(
    patients: &[Patient],
    incidents: &[Incident],
    now: NaiveDateTime,
) -> DashboardSummary {
    let mut upcoming: Vec<Incident> = incidents
        .iter()
        .filter(|i| i.status == IncidentStatus::Scheduled && i.appointment_date > now)
        .cloned()
        .collect();
    upcoming.sort_by_key(|i| i.appointment_date);
    upcoming.truncate(UPCOMING_LIMIT);

    let completed = incidents.iter().filter(|i| i.status == IncidentStatus::Completed);
    let total_revenue: f64 = completed.clone().filter_map(|i| i.cost).sum();

    let mut top_patients: Vec<PatientSpend> = patients
        .iter()
        .map(|patient| {
            let own = incidents.iter().filter(|i| i.patient_id == patient.id);
            PatientSpend {
                patient: patient.clone(),
                appointment_count: own.clone().count(),
                total_spent: own.filter_map(|i| i.cost).sum(),
            }
        })
        .collect();
    // Stable sort keeps insertion order among equal spenders.
    top_patients.sort_by(|a, b| b.total_spent.total_cmp(&a.total_spent));
    top_patients.truncate(TOP_PATIENTS_LIMIT);

    DashboardSummary {
        upcoming,
        completed_treatments: completed.count(),
        pending_treatments: incidents
            .iter()
            .filter(|i| i.status == IncidentStatus::Scheduled)
            .count(),
        total_revenue,
        top_patients,
    }
}

/// One patient's view of their own records.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientOverview {
    pub upcoming: Vec<Incident>,
    pub completed: Vec<Incident>,
    pub total_spent: f64,
    /// Every appointment, newest first.
    pub history: Vec<Incident>,
}

pub fn patient_overview(
    incidents: &[Incident],
    patient_id: &str,
    now: NaiveDateTime,
) -> PatientOverview {
    let own: Vec<&Incident> = incidents.iter().filter(|i| i.patient_id == patient_id).collect();

    let mut upcoming: Vec<Incident> = own
        .iter()
        .filter(|i| i.status == IncidentStatus::Scheduled && i.appointment_date > now)
        .map(|i| (*i).clone())
        .collect();
    upcoming.sort_by_key(|i| i.appointment_date);
    upcoming.truncate(PATIENT_UPCOMING_LIMIT);

    let completed: Vec<Incident> = own
        .iter()
        .filter(|i| i.status == IncidentStatus::Completed)
        .map(|i| (*i).clone())
        .collect();
    let total_spent: f64 = completed.iter().filter_map(|i| i.cost).sum();

    let mut history: Vec<Incident> = own.into_iter().cloned().collect();
    history.sort_by(|a, b| b.appointment_date.cmp(&a.appointment_date));

    PatientOverview {
        upcoming,
        completed,
        total_spent,
        history,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::seed::{seed_incidents, seed_patients};
    use chrono::NaiveDate;

    fn at(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d).unwrap().and_hms_opt(0, 0, 0).unwrap()
    }

    #[test]
    fn summarizes_seed_data() {
        let (patients, incidents) = (seed_patients().unwrap(), seed_incidents().unwrap());
        let summary = summarize(&patients, &incidents, at(2025, 1, 21));

        let upcoming: Vec<&str> = summary.upcoming.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(upcoming, vec!["i5", "i3"]);
        assert_eq!(summary.completed_treatments, 2);
        assert_eq!(summary.pending_treatments, 3);
        assert_eq!(summary.total_revenue, 200.0);
        assert_eq!(summary.top_patients.len(), 5);
        assert_eq!(summary.top_patients[0].patient.id, "p1");
        assert_eq!(summary.top_patients[0].appointment_count, 3);
        assert_eq!(summary.top_patients[0].total_spent, 200.0);
    }

    #[test]
    fn past_appointments_are_not_upcoming() {
        let summary = summarize(&[], &seed_incidents().unwrap(), at(2026, 1, 1));
        assert!(summary.upcoming.is_empty());
        assert!(summary.top_patients.is_empty());
    }

    #[test]
    fn patient_overview_splits_upcoming_completed_and_history() {
        let incidents = seed_incidents().unwrap();
        let overview = patient_overview(&incidents, "p1", at(2025, 1, 21));

        let upcoming: Vec<&str> = overview.upcoming.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(upcoming, vec!["i3"]);
        let completed: Vec<&str> = overview.completed.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(completed, vec!["i1", "i2"]);
        assert_eq!(overview.total_spent, 200.0);
        let history: Vec<&str> = overview.history.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(history, vec!["i3", "i1", "i2"]);
    }

    #[test]
    fn patient_upcoming_is_capped() {
        let mut incidents = seed_incidents().unwrap();
        for day in [5, 3, 4] {
            let mut extra = incidents[2].clone();
            extra.id = format!("x{}", day);
            extra.appointment_date = at(2025, 3, day);
            incidents.push(extra);
        }

        let overview = patient_overview(&incidents, "p1", at(2025, 2, 11));
        let upcoming: Vec<&str> = overview.upcoming.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(upcoming, vec!["x3", "x4"]);
        assert_eq!(overview.history.len(), 6);
    }
}
