//! Labelled metrics derived from the admin and doctor dashboards.

use std::fmt;

use crate::api::models::{AdminDashboardStats, DoctorDashboard};
use crate::errors::Result;
use crate::services::PortalQueries;
use crate::session::{Role, UserProfile};

#[derive(Debug, Clone, PartialEq)]
pub enum MetricValue {
    Count(u64),
    Percent(f64),
    Unavailable,
}

impl fmt::Display for MetricValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricValue::Count(n) => write!(f, "{}", n),
            MetricValue::Percent(p) => write!(f, "{:.1}%", p),
            MetricValue::Unavailable => f.write_str("-"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Metric {
    pub label: &'static str,
    pub value: MetricValue,
}

impl Metric {
    fn count(label: &'static str, value: Option<u64>) -> Self {
        Self {
            label,
            value: value.map_or(MetricValue::Unavailable, MetricValue::Count),
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.label, self.value)
    }
}

pub fn admin_metrics(stats: &AdminDashboardStats) -> Vec<Metric> {
    vec![
        Metric::count("Total appointments", stats.total_appointments),
        Metric::count("Pending", stats.pending_appointments),
        Metric::count("Confirmed", stats.confirmed_appointments),
        Metric::count("Completed", stats.completed_appointments),
        Metric::count("Doctors", stats.total_doctors),
        Metric::count("Patients", stats.total_patients),
        Metric {
            label: "Completion rate",
            value: rate(stats.completed_appointments, stats.total_appointments),
        },
    ]
}

pub fn doctor_metrics(dashboard: &DoctorDashboard) -> Vec<Metric> {
    vec![
        Metric::count("Today's appointments", dashboard.todays_appointments),
        Metric::count("Pending", dashboard.pending_appointments),
        Metric::count("Completed", dashboard.completed_appointments),
        Metric::count("Patients (30 days)", dashboard.total_patients_30_days),
    ]
}

/// Fetches the dashboard that fits the user's role. Roles without a
/// dashboard get an empty list.
pub async fn metrics_for(queries: &PortalQueries, user: &UserProfile) -> Result<Vec<Metric>> {
    match user.role {
        Role::Admin => Ok(admin_metrics(&queries.admin_dashboard().await?)),
        Role::Doctor => Ok(doctor_metrics(&queries.doctor_dashboard().await?)),
        _ => Ok(Vec::new()),
    }
}

fn rate(part: Option<u64>, whole: Option<u64>) -> MetricValue {
    match (part, whole) {
        (Some(part), Some(whole)) if whole > 0 => {
            MetricValue::Percent(part as f64 * 100.0 / whole as f64)
        }
        _ => MetricValue::Unavailable,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn admin_metrics_include_completion_rate() {
        let stats: AdminDashboardStats = serde_json::from_value(json!({
            "totalAppointments": 40,
            "completedAppointments": 10,
            "pendingAppointments": 5
        }))
        .unwrap();
        let metrics = admin_metrics(&stats);

        assert_eq!(metrics[0].value, MetricValue::Count(40));
        assert_eq!(metrics[4].value, MetricValue::Unavailable);
        let rate = metrics.iter().find(|m| m.label == "Completion rate").unwrap();
        assert_eq!(rate.to_string(), "Completion rate: 25.0%");
    }

    #[test]
    fn zero_total_has_no_rate() {
        assert_eq!(rate(Some(0), Some(0)), MetricValue::Unavailable);
    }

    #[test]
    fn doctor_metrics_read_thirty_day_patients() {
        let dashboard: DoctorDashboard = serde_json::from_value(json!({
            "todaysAppointments": 3,
            "totalPatients30Days": 57
        }))
        .unwrap();
        let metrics = doctor_metrics(&dashboard);
        assert_eq!(metrics[3].to_string(), "Patients (30 days): 57");
        assert_eq!(metrics[1].to_string(), "Pending: -");
    }
}
