//! Tenant directory
//!
//! Read-only lookup of registered tenants by unit number. Seeded in memory;
//! a production deployment would back this with the property-management
//! system of record.

use std::collections::HashMap;

/// A registered tenant.
#[derive(Debug, Clone)]
pub struct Tenant {
    pub unit_number: String,
    pub name: String,
    pub phone: String,
    pub email: String,
}

/// Directory of registered tenants, keyed by unit number.
#[derive(Debug, Default)]
pub struct TenantDirectory {
    tenants: HashMap<String, Tenant>,
}

impl TenantDirectory {
    /// Build the seeded directory.
    pub fn seeded() -> Self {
        let seed = [
            ("101", "Priya Sharma", "+447700900001", "priya@example.com"),
            ("202", "James O'Brien", "+447700900002", "james@example.com"),
            ("305", "Aisha Patel", "+447700900003", "aisha@example.com"),
            ("410", "Carlos Mendez", "+447700900004", "carlos@example.com"),
        ];

        let tenants = seed
            .into_iter()
            .map(|(unit, name, phone, email)| {
                (
                    unit.to_string(),
                    Tenant {
                        unit_number: unit.to_string(),
                        name: name.to_string(),
                        phone: phone.to_string(),
                        email: email.to_string(),
                    },
                )
            })
            .collect();

        Self { tenants }
    }

    /// Look up a tenant by unit number. Whitespace around the unit number
    /// is tolerated; callers read it back over the phone.
    pub fn lookup(&self, unit_number: &str) -> Option<&Tenant> {
        self.tenants.get(unit_number.trim())
    }

    pub fn len(&self) -> usize {
        self.tenants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tenants.is_empty()
    }
}
