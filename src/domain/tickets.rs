//! Complaint tickets
//!
//! Category and SLA tables, assurance scripts, and the concurrent ticket
//! store. Tickets live in memory for the lifetime of the process; each
//! record is owned by its key in the map, so concurrent sessions filing
//! tickets never contend on the same entry.

use dashmap::DashMap;
use serde::Serialize;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use uuid::Uuid;

/// One row of the category configuration table.
#[derive(Debug, Clone, Copy)]
pub struct CategoryInfo {
    pub key: &'static str,
    pub label: &'static str,
    pub sla_hours: u64,
    pub team: &'static str,
    pub priority: u8,
    pub emergency: bool,
}

/// Category configuration: label, SLA hours, responsible team, priority
/// rank, emergency classification. `medical_emergency` has a zero-hour SLA
/// because the right answer is the emergency services, not a contractor.
pub static CATEGORY_TABLE: &[CategoryInfo] = &[
    // Emergencies
    CategoryInfo { key: "gas_leak", label: "Gas Leak", sla_hours: 1, team: "Emergency Response", priority: 1, emergency: true },
    CategoryInfo { key: "fire", label: "Fire / Smoke", sla_hours: 1, team: "Emergency Response", priority: 1, emergency: true },
    CategoryInfo { key: "flood", label: "Flooding / Burst Pipe", sla_hours: 2, team: "Emergency Response", priority: 1, emergency: true },
    CategoryInfo { key: "structural_damage", label: "Structural Damage", sla_hours: 2, team: "Emergency Response", priority: 1, emergency: true },
    CategoryInfo { key: "no_heat_winter", label: "No Heating (Winter)", sla_hours: 4, team: "Emergency Maintenance", priority: 2, emergency: true },
    CategoryInfo { key: "power_outage", label: "Power Outage", sla_hours: 4, team: "Emergency Maintenance", priority: 2, emergency: true },
    CategoryInfo { key: "security_breach", label: "Security / Break-in", sla_hours: 2, team: "Security Team", priority: 1, emergency: true },
    CategoryInfo { key: "medical_emergency", label: "Medical Emergency", sla_hours: 0, team: "Emergency Services (999)", priority: 1, emergency: true },
    // Non-emergencies
    CategoryInfo { key: "plumbing", label: "Plumbing Issue", sla_hours: 24, team: "Maintenance Team", priority: 3, emergency: false },
    CategoryInfo { key: "electrical", label: "Electrical Issue", sla_hours: 24, team: "Maintenance Team", priority: 3, emergency: false },
    CategoryInfo { key: "hvac", label: "Heating / AC Issue", sla_hours: 24, team: "Maintenance Team", priority: 3, emergency: false },
    CategoryInfo { key: "appliance", label: "Appliance Fault", sla_hours: 48, team: "Maintenance Team", priority: 4, emergency: false },
    CategoryInfo { key: "pest", label: "Pest Infestation", sla_hours: 48, team: "Pest Control Team", priority: 4, emergency: false },
    CategoryInfo { key: "noise_complaint", label: "Noise Complaint", sla_hours: 24, team: "Property Management", priority: 3, emergency: false },
    CategoryInfo { key: "neighbour_dispute", label: "Neighbour Dispute", sla_hours: 48, team: "Property Management", priority: 4, emergency: false },
    CategoryInfo { key: "parking", label: "Parking Issue", sla_hours: 48, team: "Property Management", priority: 4, emergency: false },
    CategoryInfo { key: "common_area", label: "Common Area Issue", sla_hours: 48, team: "Facilities Team", priority: 4, emergency: false },
    CategoryInfo { key: "lift", label: "Lift / Elevator Issue", sla_hours: 12, team: "Maintenance Team", priority: 3, emergency: false },
    CategoryInfo { key: "entry_system", label: "Entry System / Keys", sla_hours: 12, team: "Maintenance Team", priority: 3, emergency: false },
    CategoryInfo { key: "rubbish", label: "Waste / Rubbish", sla_hours: 72, team: "Facilities Team", priority: 5, emergency: false },
    CategoryInfo { key: "leaking", label: "Leak (non-urgent)", sla_hours: 24, team: "Maintenance Team", priority: 3, emergency: false },
    CategoryInfo { key: "damp_mould", label: "Damp / Mould", sla_hours: 72, team: "Maintenance Team", priority: 4, emergency: false },
    CategoryInfo { key: "other", label: "General Complaint", sla_hours: 48, team: "Property Management", priority: 4, emergency: false },
];

/// Look up a category; anything unrecognized files as `other`.
pub fn category_info(category: &str) -> &'static CategoryInfo {
    let key = category.trim().to_lowercase();
    CATEGORY_TABLE
        .iter()
        .find(|c| c.key == key)
        .unwrap_or_else(|| {
            CATEGORY_TABLE
                .iter()
                .find(|c| c.key == "other")
                .expect("category table has an 'other' row")
        })
}

/// Spoken-friendly rendering of an SLA.
pub fn sla_to_words(hours: u64) -> String {
    match hours {
        0 => "immediate - call 999 now".to_string(),
        1 => "within 1 hour".to_string(),
        h if h < 24 => format!("within {h} hours"),
        h => {
            let days = h / 24;
            format!(
                "within {days} working day{}",
                if days > 1 { "s" } else { "" }
            )
        }
    }
}

/// Assurance script read aloud word-for-word after a complaint is filed.
pub fn assurance_script(category: &str) -> &'static str {
    match category {
        "gas_leak" => {
            "This is a critical emergency. Our emergency response team has been alerted \
             right now and will be at your property within one hour. Please leave your flat \
             immediately, do not touch any light switches or electrical devices, and wait outside. \
             We will call you back within 15 minutes to confirm someone is on their way."
        }
        "fire" => {
            "I've flagged this as a life-safety emergency. Please evacuate the building now \
             and call 999 if you haven't already. Our emergency team is being dispatched and \
             will coordinate with the fire service. You will receive a call back within 15 minutes."
        }
        "flood" => {
            "A burst pipe or flooding is a critical emergency. Our emergency plumber has been \
             paged and will arrive within two hours. If it's safe to do so, please turn off the \
             water stopcock - it's usually under the kitchen sink. Move valuables away from the \
             water if possible. We'll call you within 30 minutes to confirm the engineer's ETA."
        }
        "structural_damage" => {
            "Structural damage is being treated as an emergency. A qualified surveyor will inspect \
             your property within two hours. Please avoid the affected area for your safety. \
             We'll call you within 30 minutes with an update."
        }
        "no_heat_winter" => {
            "No heating in winter is classified as urgent under housing law. An emergency heating \
             engineer has been assigned and will contact you within four hours. If you have \
             vulnerable individuals - children, elderly, or anyone with a medical condition - \
             please let me note that now so we can escalate the priority further."
        }
        "power_outage" => {
            "We've raised this as an urgent electrical fault. Our team will assess within four hours. \
             Please avoid using candles for safety. If the outage affects the entire building, we're \
             already contacting the utility provider. You'll receive a text update within the hour."
        }
        "security_breach" => {
            "Your safety is the top priority. Our security team has been alerted and will respond \
             within two hours. If you feel you are in immediate danger, please call 999 right now. \
             We will also review CCTV footage and arrange a security review of your entry points."
        }
        "medical_emergency" => {
            "Please call 999 immediately - this requires the ambulance service directly. \
             I'm logging this on your account so our property manager is made aware and can provide \
             any assistance needed. Please stay on the line with the emergency services."
        }
        "plumbing" => {
            "Your plumbing complaint has been logged and assigned to our maintenance team. \
             A qualified plumber will contact you within 24 hours to arrange a convenient time \
             to visit. You'll also receive a confirmation text shortly. \
             If the issue gets worse or causes flooding, please call us back immediately."
        }
        "electrical" => {
            "Your electrical complaint has been raised with our maintenance team and will be \
             assessed within 24 hours. An electrician will contact you to arrange access. \
             In the meantime, please avoid using any faulty sockets or switches. \
             If you notice sparking or smell burning, please call us back straight away."
        }
        "hvac" => {
            "Your heating or air conditioning issue has been logged. Our HVAC team will \
             be in touch within 24 hours to arrange a visit. If this becomes urgent - \
             particularly in cold weather - call back and we'll escalate it immediately."
        }
        "appliance" => {
            "Your appliance fault has been recorded and passed to our maintenance team. \
             They will contact you within 48 hours to assess and repair or replace it. \
             If it's a landlord-provided appliance, all costs will be covered by us."
        }
        "pest" => {
            "A pest report has been raised and passed to our specialist pest control team. \
             They will contact you within 48 hours to arrange an inspection and treatment. \
             Please try not to disturb any nesting areas in the meantime."
        }
        "noise_complaint" => {
            "Your noise complaint has been formally logged. Our property management team will \
             investigate and contact the relevant party within 24 hours. If the noise is causing \
             serious distress tonight, you can also contact your local council's noise service. \
             We'll send you a written update within two working days."
        }
        "neighbour_dispute" => {
            "Your concern has been noted and will be reviewed by our property manager. \
             We take disputes seriously and aim to mediate fairly for all residents. \
             A member of the team will contact you within 48 hours to discuss next steps."
        }
        "parking" => {
            "Your parking complaint has been logged. Our facilities team will review the \
             situation within 48 hours. If there is a vehicle blocking emergency access, \
             please let me know now and we can escalate that as a priority."
        }
        "common_area" => {
            "Your report about the common area has been sent to our facilities team, \
             who aim to address communal issues within 48 hours. If it is a safety hazard, \
             please say so now and we'll treat it as a priority."
        }
        "lift" => {
            "The lift issue has been raised with our maintenance team as a priority fault. \
             An engineer will be assigned within 12 hours. If you have accessibility needs and \
             the lift is your only route of access, please tell me now and we'll arrange a priority visit today."
        }
        "entry_system" => {
            "Your entry system or key issue has been logged. Our maintenance team will respond \
             within 12 hours. If you are currently locked out, please stay on the line and \
             I'll connect you with our out-of-hours locksmith service right now."
        }
        "rubbish" => {
            "Your waste and rubbish complaint has been passed to our facilities team and \
             will be addressed within 72 hours. Thank you for flagging this - keeping \
             communal areas clean is important for everyone in the building."
        }
        "leaking" => {
            "The non-urgent leak has been logged and our plumbing team will contact you within \
             24 hours to arrange an inspection. If the leak worsens, please call back immediately \
             so we can upgrade the priority."
        }
        "damp_mould" => {
            "Damp and mould is a health concern we take very seriously. Your complaint has been \
             logged and our maintenance team will carry out a full assessment within 72 hours. \
             We will recommend the appropriate treatment and ensure this is resolved properly."
        }
        _ => {
            "Your complaint has been logged and a reference number has been created. \
             Our property management team will review it within 48 hours and contact you \
             with an update. If you feel this needs urgent attention, please let me know now."
        }
    }
}

/// Plain-English steps so the tenant knows exactly what happens next.
pub fn build_response_plan(info: &CategoryInfo) -> String {
    if info.key == "medical_emergency" {
        return "Step 1 - Call 999 immediately for the ambulance service.\n\
                Step 2 - Your property manager has been notified and will follow up.\n\
                Step 3 - A welfare check will be arranged if needed."
            .to_string();
    }
    if info.emergency {
        return format!(
            "Step 1 - Your complaint has been flagged as an EMERGENCY with our {team}.\n\
             Step 2 - A specialist will be dispatched {sla}.\n\
             Step 3 - You will receive a call-back within 15-30 minutes to confirm the engineer's ETA.\n\
             Step 4 - Once the immediate risk is made safe, a follow-up inspection will be scheduled.\n\
             Step 5 - A written incident report will be sent to you within 24 hours of resolution.",
            team = info.team,
            sla = sla_to_words(info.sla_hours),
        );
    }
    format!(
        "Step 1 - Your {label} complaint has been logged and assigned to the {team}.\n\
         Step 2 - A team member will contact you {sla} to arrange access or discuss next steps.\n\
         Step 3 - All repair work will be carried out by a qualified contractor at no cost to you.\n\
         Step 4 - You will receive SMS and email updates as the ticket progresses.\n\
         Step 5 - Once the work is complete, we will ask you to confirm the issue is resolved before closing the ticket.",
        label = info.label,
        team = info.team,
        sla = sla_to_words(info.sla_hours),
    )
}

/// A filed complaint ticket.
#[derive(Debug, Clone, Serialize)]
pub struct Ticket {
    pub ticket_id: String,
    pub unit_number: String,
    pub tenant_name: String,
    pub contact_number: Option<String>,
    pub category: String,
    pub label: String,
    pub description: String,
    pub is_emergency: bool,
    pub priority: u8,
    pub team: String,
    pub sla_hours: u64,
    pub status: String,
    pub created_at: String,
    pub deadline: String,
    pub response_plan: String,
}

impl Ticket {
    /// Hours until the SLA deadline, floored at zero.
    pub fn hours_remaining(&self, now: OffsetDateTime) -> f64 {
        let Ok(deadline) = OffsetDateTime::parse(&self.deadline, &Rfc3339) else {
            return 0.0;
        };
        let remaining = (deadline - now).as_seconds_f64() / 3600.0;
        (remaining.max(0.0) * 10.0).round() / 10.0
    }
}

/// In-memory complaint ticket store.
#[derive(Debug, Default)]
pub struct TicketStore {
    tickets: DashMap<String, Ticket>,
}

impl TicketStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// File a new ticket and return a copy of the stored record.
    pub fn file(
        &self,
        unit_number: &str,
        category: &str,
        description: &str,
        tenant_name: &str,
        contact_number: Option<String>,
    ) -> Ticket {
        let info = category_info(category);

        let ticket_id = format!(
            "TKT-{}",
            Uuid::new_v4().simple().to_string()[..8].to_uppercase()
        );
        let now = OffsetDateTime::now_utc();
        let deadline = now + time::Duration::hours(info.sla_hours as i64);

        let ticket = Ticket {
            ticket_id: ticket_id.clone(),
            unit_number: unit_number.to_string(),
            tenant_name: tenant_name.to_string(),
            contact_number,
            category: info.key.to_string(),
            label: info.label.to_string(),
            description: description.to_string(),
            is_emergency: info.emergency,
            priority: info.priority,
            team: info.team.to_string(),
            sla_hours: info.sla_hours,
            status: "open".to_string(),
            created_at: now.format(&Rfc3339).unwrap_or_default(),
            deadline: deadline.format(&Rfc3339).unwrap_or_default(),
            response_plan: build_response_plan(info),
        };

        self.tickets.insert(ticket_id, ticket.clone());
        ticket
    }

    /// Fetch a ticket by reference. The reference is normalized the way a
    /// caller reads it out: trimmed and uppercased.
    pub fn get(&self, ticket_id: &str) -> Option<Ticket> {
        self.tickets
            .get(ticket_id.trim().to_uppercase().as_str())
            .map(|entry| entry.value().clone())
    }

    /// All tickets on record for a unit, oldest first.
    pub fn for_unit(&self, unit_number: &str) -> Vec<Ticket> {
        let mut tickets: Vec<Ticket> = self
            .tickets
            .iter()
            .filter(|entry| entry.unit_number == unit_number)
            .map(|entry| entry.value().clone())
            .collect();
        tickets.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        tickets
    }

    pub fn len(&self) -> usize {
        self.tickets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tickets.is_empty()
    }
}
