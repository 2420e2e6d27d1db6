//! Test to trigger ts-rs bindings export
//! Run with: cargo test export_bindings

#[cfg(test)]
mod tests {
    use ts_rs::TS;

    use crate::features::auth::types::{LoginRequest, LoginResponse, LoginUser};
    use crate::features::currency::types::{ConversionState, HistoryRecord, RateEntry, TimeInterval};
    use crate::shared::settings::AppSettings;

    #[test]
    fn export_bindings() {
        // The bindings are written under TS_RS_EXPORT_DIR (./bindings by default)
        RateEntry::export_all().expect("Failed to export RateEntry");
        HistoryRecord::export_all().expect("Failed to export HistoryRecord");
        ConversionState::export_all().expect("Failed to export ConversionState");
        TimeInterval::export_all().expect("Failed to export TimeInterval");

        LoginRequest::export_all().expect("Failed to export LoginRequest");
        LoginUser::export_all().expect("Failed to export LoginUser");
        LoginResponse::export_all().expect("Failed to export LoginResponse");

        AppSettings::export_all().expect("Failed to export AppSettings");
    }

    #[test]
    fn history_record_binding_uses_wire_names() {
        let decl = HistoryRecord::decl();
        assert!(decl.contains("pureExchangeRate"));
        assert!(decl.contains("exchangeRate: string"));
        assert!(decl.contains("id: number"));
    }
}
