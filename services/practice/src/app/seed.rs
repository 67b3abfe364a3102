//! services/practice/src/app/seed.rs
//!
//! Demo records written on first start when a collection is empty.

use dental_core::domain::{Incident, Patient};

const SEED_PATIENTS: &str = r#"[
  {"id": "p1", "name": "John Doe", "dob": "1990-05-10", "contact": "1234567890",
   "email": "john@entnt.in", "healthInfo": "No allergies"},
  {"id": "p2", "name": "Jane Smith", "dob": "1985-08-15", "contact": "0987654321",
   "email": "jane@entnt.in", "healthInfo": "Diabetic, allergic to penicillin"},
  {"id": "p3", "name": "Mike Johnson", "dob": "1992-03-22", "contact": "5551234567",
   "email": "mike@entnt.in", "healthInfo": "High blood pressure"},
  {"id": "p4", "name": "Sarah Wilson", "dob": "1988-11-08", "contact": "5559876543",
   "email": "sarah@entnt.in", "healthInfo": "No known allergies"},
  {"id": "p5", "name": "David Brown", "dob": "1995-07-14", "contact": "5555551234",
   "email": "david@entnt.in", "healthInfo": "Asthmatic"}
]"#;

const SEED_INCIDENTS: &str = r#"[
  {"id": "i1", "patientId": "p1", "title": "Toothache", "description": "Upper molar pain",
   "comments": "Sensitive to cold", "appointmentDate": "2025-01-15T10:00:00", "cost": 80,
   "status": "Completed", "treatment": "Pain relief medication prescribed, follow-up scheduled",
   "files": [
     {"name": "invoice.pdf", "url": "data:application/pdf;base64,JVBERi0xLjQKJSVFT0YK",
      "type": "application/pdf", "size": 15, "uploadDate": "2025-01-15T10:30:00Z"},
     {"name": "xray.png",
      "url": "data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNkYPhfDwAChwGA60e6kgAAAABJRU5ErkJggg==",
      "type": "image/png", "size": 70, "uploadDate": "2025-01-15T10:35:00Z"}
   ]},
  {"id": "i2", "patientId": "p1", "title": "Routine Checkup",
   "description": "Regular dental examination and cleaning", "comments": "Good oral hygiene maintained",
   "appointmentDate": "2024-12-15T14:00:00", "cost": 120, "status": "Completed",
   "treatment": "Professional cleaning, fluoride treatment applied", "files": []},
  {"id": "i3", "patientId": "p1", "title": "Tooth Filling", "description": "Cavity treatment on upper molar",
   "comments": "Patient reported sensitivity to sweet foods", "appointmentDate": "2025-02-10T09:30:00",
   "status": "Scheduled", "files": []},
  {"id": "i4", "patientId": "p2", "title": "Root Canal Treatment",
   "description": "Root canal therapy for lower molar", "comments": "Severe pain reported, emergency appointment",
   "appointmentDate": "2025-01-20T15:00:00", "status": "Scheduled", "files": []},
  {"id": "i5", "patientId": "p3", "title": "Teeth Cleaning",
   "description": "Professional dental cleaning and polishing", "comments": "Regular maintenance appointment",
   "appointmentDate": "2025-01-25T13:30:00", "status": "Scheduled", "files": []}
]"#;

pub fn seed_patients() -> serde_json::Result<Vec<Patient>> {
    serde_json::from_str(SEED_PATIENTS)
}

pub fn seed_incidents() -> serde_json::Result<Vec<Incident>> {
    serde_json::from_str(SEED_INCIDENTS)
}
