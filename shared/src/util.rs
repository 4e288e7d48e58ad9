/// Current UTC timestamp in milliseconds
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Today's date in local time (business day)
pub fn today() -> chrono::NaiveDate {
    chrono::Local::now().date_naive()
}

/// Generate a new resource id (UUID v4, hyphenated)
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Generate a human-facing invoice number.
///
/// Layout: `{prefix}-{last 6 digits of unix millis}-{3 random digits}`,
/// e.g. `INV-512304-087`. Not guaranteed unique; callers that need
/// uniqueness check against existing numbers and retry.
pub fn generate_invoice_number(prefix: &str) -> String {
    use rand::Rng;
    let stamp = now_millis().rem_euclid(1_000_000);
    let suffix: u16 = rand::thread_rng().gen_range(0..1000);
    format!("{}-{:06}-{:03}", prefix, stamp, suffix)
}
