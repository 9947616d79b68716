//! End-to-end submission workflow tests against the SQLite store.

use clinic_billing_core::db::{Database, MemoryStore, PatientStore};
use clinic_billing_core::desk::{BillingDesk, SubmitOutcome, WorkflowState, DUPLICATE_MESSAGE};
use clinic_billing_core::models::{PatientForm, PaymentMethod, TransactionStatus};
use clinic_billing_core::DeskConfig;
use rust_decimal::Decimal;

fn make_form(name: &str, mobile: &str, total: &str, paid: &str, method: &str) -> PatientForm {
    PatientForm {
        fullname: name.to_string(),
        mobile: mobile.to_string(),
        treatment: "Consultation".to_string(),
        total_amount: total.to_string(),
        paid_amount: paid.to_string(),
        payment_type: method.to_string(),
        previous_paid: None,
    }
}

fn sqlite_desk() -> BillingDesk<Database> {
    BillingDesk::open(Database::open_in_memory().unwrap(), DeskConfig::default()).unwrap()
}

#[test]
fn test_partial_payment_is_stored() {
    let mut desk = sqlite_desk();
    desk.set_form(make_form("A", "1", "1000", "400", "cash"));

    let SubmitOutcome::Accepted { patient, .. } = desk.submit().unwrap() else {
        panic!("expected accepted submission");
    };

    let stored = desk
        .store()
        .get_patient(&patient.registration_id)
        .unwrap()
        .unwrap();
    assert_eq!(stored.invoice.total, Decimal::from(1000));

    let txs = &stored.invoice.transactions;
    assert_eq!(txs.len(), 2);
    assert_eq!(txs[0].status, TransactionStatus::Pending);
    assert_eq!(txs[0].amount, Decimal::from(600));
    assert_eq!(txs[0].payment_method, PaymentMethod::None);
    assert_eq!(txs[1].status, TransactionStatus::Paid);
    assert_eq!(txs[1].amount, Decimal::from(400));
    assert_eq!(txs[1].payment_method, PaymentMethod::Cash);
}

#[test]
fn test_full_payment_keeps_zero_pending() {
    let mut desk = sqlite_desk();
    desk.set_form(make_form("A", "1", "1000", "1000", "Cash"));
    desk.submit().unwrap();

    let txs = &desk.roster().patients()[0].invoice.transactions;
    assert_eq!(txs.len(), 2);
    assert!(txs[0].amount.is_zero());
    assert_eq!(txs[0].status, TransactionStatus::Pending);
    assert_eq!(txs[1].amount, Decimal::from(1000));
}

#[test]
fn test_unpaid_visit_stores_single_transaction() {
    let mut desk = sqlite_desk();
    desk.set_form(make_form("A", "1", "1000", "", "Card"));
    desk.submit().unwrap();

    let txs = &desk.roster().patients()[0].invoice.transactions;
    assert_eq!(txs.len(), 1);
    assert_eq!(txs[0].status, TransactionStatus::Pending);
}

#[test]
fn test_second_identical_submission_is_rejected() {
    let mut desk = BillingDesk::open(MemoryStore::new(), DeskConfig::default()).unwrap();

    desk.set_form(make_form("A", "1", "100", "0", "cash"));
    assert!(matches!(desk.submit().unwrap(), SubmitOutcome::Accepted { .. }));

    desk.set_form(make_form("A", "1", "100", "0", "cash"));
    match desk.submit().unwrap() {
        SubmitOutcome::Duplicate(notice) => assert_eq!(notice.message, DUPLICATE_MESSAGE),
        other => panic!("unexpected outcome: {:?}", other),
    }
    assert_eq!(desk.store().insert_calls(), 1);
}

#[test]
fn test_roster_contains_new_patient_exactly_once() {
    let mut desk = sqlite_desk();
    desk.set_form(make_form("A", "1", "100", "50", "cash"));
    desk.submit().unwrap();
    desk.set_form(make_form("B", "2", "100", "50", "card"));
    let SubmitOutcome::Accepted { patient, .. } = desk.submit().unwrap() else {
        panic!("expected accepted submission");
    };

    let fetched = desk.store().fetch_all().unwrap();
    let matches = fetched
        .iter()
        .filter(|p| p.registration_id == patient.registration_id)
        .count();
    assert_eq!(matches, 1);
    assert_eq!(desk.roster().patients(), fetched.as_slice());
}

#[test]
fn test_refresh_sees_records_created_elsewhere() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("clinic.db");

    let mut front = BillingDesk::open(Database::open(&path).unwrap(), DeskConfig::default()).unwrap();
    let mut back = BillingDesk::open(Database::open(&path).unwrap(), DeskConfig::default()).unwrap();

    back.set_form(make_form("A", "1", "100", "0", "cash"));
    back.submit().unwrap();

    // Front desk learns about it on its next successful round-trip
    front.set_form(make_form("B", "2", "100", "0", "cash"));
    front.submit().unwrap();
    assert_eq!(front.roster().len(), 2);

    front.set_form(make_form("A", "1", "100", "0", "cash"));
    assert!(matches!(front.submit().unwrap(), SubmitOutcome::Duplicate(_)));
}

#[test]
fn test_bill_is_ready_after_submission() {
    let mut desk = sqlite_desk();
    let mut form = make_form("A", "1", "2500", "1000", "card");
    form.previous_paid = Some("300".to_string());
    desk.set_form(form.clone());

    desk.submit().unwrap();

    let WorkflowState::ReadyToPrint(bill) = desk.state() else {
        panic!("expected a bill");
    };
    assert_eq!(bill.values, form);
    assert_eq!(bill.amount_due_display("Rs."), "Rs.1,500.00");
    assert_eq!(bill.reference_number, "BILL000001");

    desk.clear();
    assert_eq!(desk.state(), &WorkflowState::Idle);
}

#[test]
fn test_daily_summary_from_roster() {
    let config = DeskConfig {
        utc_offset_minutes: 330,
        ..DeskConfig::default()
    };
    let mut desk = BillingDesk::open(Database::open_in_memory().unwrap(), config).unwrap();
    desk.set_form(make_form("A", "1", "1000", "400", "cash"));
    desk.submit().unwrap();
    desk.set_form(make_form("B", "2", "500", "500", "card"));
    desk.submit().unwrap();

    // Pin both registrations to late evening UTC, which is the next morning at +05:30.
    desk.store()
        .conn()
        .execute(
            "UPDATE patients SET created_at = ?1",
            ["2026-05-01T20:00:00+00:00"],
        )
        .unwrap();
    desk.refresh().unwrap();

    let may_1 = chrono::NaiveDate::from_ymd_opt(2026, 5, 1).unwrap();
    assert_eq!(desk.daily_summary(may_1).unwrap().patient_count, 0);

    let may_2 = chrono::NaiveDate::from_ymd_opt(2026, 5, 2).unwrap();
    let summary = desk.daily_summary(may_2).unwrap();

    assert_eq!(summary.patient_count, 2);
    assert_eq!(summary.billed_total, Decimal::from(1500));
    assert_eq!(summary.collected_with(PaymentMethod::Cash), Decimal::from(400));
    assert_eq!(summary.collected_with(PaymentMethod::Card), Decimal::from(500));
    assert_eq!(summary.outstanding, Decimal::from(600));
}
