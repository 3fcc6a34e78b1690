//! WhatsApp payment reminders.
//!
//! Only the deep link is produced; the operator opens it and sends the
//! message by hand.

use chrono::NaiveDate;
use url::Url;
use wifinet_core::{digits_only, Bill, Customer, Rupiah, WifinetError, WifinetResult};

const MONTH_NAMES: [&str; 12] = [
    "Januari",
    "Februari",
    "Maret",
    "April",
    "Mei",
    "Juni",
    "Juli",
    "Agustus",
    "September",
    "Oktober",
    "November",
    "Desember",
];

pub fn month_name(month: u32) -> Option<&'static str> {
    month
        .checked_sub(1)
        .and_then(|i| MONTH_NAMES.get(i as usize))
        .copied()
}

/// `Rp 1.250.000` style formatting, no decimals.
pub fn format_rupiah(amount: Rupiah) -> String {
    let digits = amount.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }
    if amount < 0 {
        format!("-Rp {grouped}")
    } else {
        format!("Rp {grouped}")
    }
}

/// Reminder text; overdue bills get a warning header and a disconnection
/// notice instead of the plain due date line.
pub fn reminder_message(bill: &Bill, customer: &Customer, today: NaiveDate) -> String {
    let late = bill.is_overdue(today);
    let greeting = if late {
        "*PERINGATAN JATUH TEMPO*"
    } else {
        "*TAGIHAN WIFI*"
    };
    let period = bill
        .month_number()
        .and_then(month_name)
        .unwrap_or(bill.month.as_str());
    let due = bill.due_date.format("%Y-%m-%d");
    let body = if late {
        format!(
            "Tagihan Anda saat ini sudah melewati batas jatuh tempo ({due}). \
             Mohon segera lakukan pembayaran untuk menghindari pemutusan layanan."
        )
    } else {
        format!("Jatuh tempo pembayaran: {due}.")
    };

    format!(
        "{greeting}\n\nHalo Bapak/Ibu {name},\nKami informasikan tagihan WiFi periode {period} {year} \
         sebesar *{amount}*.\n\n{body}\n\nTerima kasih atas kerjasamanya.",
        name = customer.name,
        year = bill.year,
        amount = format_rupiah(bill.amount),
    )
}

/// `https://wa.me/<digits>?text=<message>` for the customer's phone.
pub fn whatsapp_link(bill: &Bill, customer: &Customer, today: NaiveDate) -> WifinetResult<String> {
    let phone = digits_only(&customer.phone);
    if phone.is_empty() {
        return Err(WifinetError::Validation(format!(
            "customer '{}' has no usable phone number",
            customer.id
        )));
    }
    let message = reminder_message(bill, customer, today);
    let url = Url::parse_with_params(&format!("https://wa.me/{phone}"), &[("text", message)])
        .map_err(|e| WifinetError::Validation(e.to_string()))?;
    Ok(url.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use wifinet_store::seed::default_dataset;

    #[test]
    fn test_format_rupiah() {
        assert_eq!(format_rupiah(0), "Rp 0");
        assert_eq!(format_rupiah(950), "Rp 950");
        assert_eq!(format_rupiah(150_000), "Rp 150.000");
        assert_eq!(format_rupiah(1_250_000), "Rp 1.250.000");
        assert_eq!(format_rupiah(-10_000), "-Rp 10.000");
    }

    #[test]
    fn test_message_switches_on_overdue() {
        let ds = default_dataset();
        let bill = ds.bill("BILL003").unwrap();
        let customer = ds.customer("CUST001").unwrap();

        let early = reminder_message(bill, customer, NaiveDate::from_ymd_opt(2024, 11, 5).unwrap());
        assert!(early.starts_with("*TAGIHAN WIFI*"));
        assert!(early.contains("periode November 2024"));
        assert!(early.contains("*Rp 150.000*"));
        assert!(early.contains("Jatuh tempo pembayaran: 2024-11-10."));

        let late = reminder_message(bill, customer, NaiveDate::from_ymd_opt(2024, 11, 11).unwrap());
        assert!(late.starts_with("*PERINGATAN JATUH TEMPO*"));
        assert!(late.contains("(2024-11-10)"));
    }

    #[test]
    fn test_link_uses_phone_digits() {
        let ds = default_dataset();
        let bill = ds.bill("BILL003").unwrap();
        let mut customer = ds.customer("CUST001").unwrap().clone();
        customer.phone = "+62 812-3456-7890".into();

        let link = whatsapp_link(bill, &customer, NaiveDate::from_ymd_opt(2024, 11, 1).unwrap()).unwrap();
        assert!(link.starts_with("https://wa.me/6281234567890?text="));

        customer.phone = "n/a".into();
        assert!(whatsapp_link(bill, &customer, NaiveDate::from_ymd_opt(2024, 11, 1).unwrap()).is_err());
    }
}
