//! Built-in dataset used for first start and as the remote fallback.

use chrono::{NaiveDate, NaiveDateTime};
use wifinet_core::{
    AdminProfile, Bill, BillStatus, Customer, CustomerStatus, Dataset, Package, PaymentAccount,
    PaymentGatewayConfig, PaymentType, Router, RouterStatus,
};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap_or_default()
}

fn stamp(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
    date(y, m, d).and_hms_opt(h, min, 0).unwrap_or_default()
}

fn package(id: &str, name: &str, speed: &str, price: i64, description: &str) -> Package {
    Package {
        id: id.into(),
        name: name.into(),
        speed: speed.into(),
        price,
        description: description.into(),
    }
}

fn bill(id: &str, customer_id: &str, month: u32, amount: i64, status: BillStatus) -> Bill {
    Bill {
        id: id.into(),
        customer_id: customer_id.into(),
        month: month.to_string(),
        year: 2024,
        amount,
        penalty_amount: None,
        status,
        due_date: date(2024, month, 10),
        paid_at: None,
        payment_method: String::new(),
        collector_id: None,
    }
}

/// Three packages, three customers in each status, a few bills, one router
/// and two transfer accounts.
pub fn default_dataset() -> Dataset {
    Dataset {
        admin_profile: AdminProfile {
            name: "Super Admin".into(),
            business_name: "WIFINET".into(),
            username: "admin".into(),
            password: Some("admin123".into()),
            auto_billing_enabled: None,
            billing_day: None,
        },
        customers: vec![
            Customer {
                id: "CUST001".into(),
                name: "Budi Santoso".into(),
                phone: "081234567890".into(),
                address: "Jl. Mawar No. 10".into(),
                package_id: "PKG001".into(),
                status: CustomerStatus::Active,
                created_at: stamp(2024, 1, 1, 10, 0),
                password: Some("123".into()),
            },
            Customer {
                id: "CUST002".into(),
                name: "Siti Aminah".into(),
                phone: "089876543210".into(),
                address: "Jl. Melati No. 5".into(),
                package_id: "PKG002".into(),
                status: CustomerStatus::Suspended,
                created_at: stamp(2024, 1, 5, 14, 30),
                password: None,
            },
            Customer {
                id: "CUST003".into(),
                name: "Rudi Hartono".into(),
                phone: "085678901234".into(),
                address: "Jl. Kamboja No. 3".into(),
                package_id: "PKG001".into(),
                status: CustomerStatus::Inactive,
                created_at: stamp(2024, 2, 10, 9, 15),
                password: None,
            },
        ],
        packages: vec![
            package(
                "PKG001",
                "Paket Hemat",
                "10 Mbps",
                150_000,
                "Cocok untuk browsing dan sosial media",
            ),
            package(
                "PKG002",
                "Paket Gamer",
                "30 Mbps",
                250_000,
                "Stabil untuk gaming dan streaming HD",
            ),
            package(
                "PKG003",
                "Paket Sultan",
                "100 Mbps",
                500_000,
                "Kecepatan maksimal untuk seluruh keluarga",
            ),
        ],
        bills: vec![
            bill("BILL001", "CUST001", 10, 150_000, BillStatus::Paid),
            bill("BILL002", "CUST002", 10, 250_000, BillStatus::Unpaid),
            bill("BILL003", "CUST001", 11, 150_000, BillStatus::Unpaid),
        ],
        collectors: Vec::new(),
        routers: vec![Router {
            id: "RTR001".into(),
            name: "Mikrotik Utama".into(),
            host: "192.168.1.1".into(),
            port: 8728,
            username: "admin".into(),
            password: None,
            status: RouterStatus::Online,
        }],
        mikrotik_users: Vec::new(),
        payment_accounts: vec![
            PaymentAccount {
                id: "ACC001".into(),
                kind: PaymentType::Bank,
                provider_name: "BCA".into(),
                account_number: "1234567890".into(),
                account_holder: "WIFINET OFFICIAL".into(),
            },
            PaymentAccount {
                id: "ACC002".into(),
                kind: PaymentType::EWallet,
                provider_name: "DANA".into(),
                account_number: "081234567890".into(),
                account_holder: "WIFINET".into(),
            },
        ],
        gateway_config: PaymentGatewayConfig {
            merchant_id: Some(String::new()),
            client_key: Some(String::new()),
            server_key: Some(String::new()),
            ..PaymentGatewayConfig::default()
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_dataset_is_consistent() {
        let ds = default_dataset();
        assert_eq!(ds.customers.len(), 3);
        assert_eq!(ds.packages.len(), 3);
        for bill in &ds.bills {
            assert!(ds.customer(&bill.customer_id).is_some());
        }
        let budi = ds.customer("CUST001").unwrap();
        assert_eq!(ds.package_price_for(budi), 150_000);
    }
}
