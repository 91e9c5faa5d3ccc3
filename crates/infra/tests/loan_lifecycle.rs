//! Loan lifecycle against the real bucket engine, wired the way the API wires
//! it (engine -> local gateway -> orchestrator).

use std::sync::Arc;

use chrono::NaiveDate;

use toolrent_core::{ActorId, BucketId, DomainError, FixedClock};
use toolrent_infra::{BorrowerDirectory, LocalInventoryGateway, RuntimeSettings};
use toolrent_inventory::{InMemoryAuditLog, InMemoryBucketStore, InventoryBucketEngine, ItemType, RegisterStock, ToolState};
use toolrent_loans::{
    AlwaysActive, CreateLoan, IdentityCollaborator, InMemoryLoanStore, LoanItemRequest, LoanLifecycleOrchestrator,
    LoanQueries, LoanSettings, PayFines, ReturnLoan,
};

type Engine = InventoryBucketEngine<InMemoryBucketStore>;
type Orchestrator = LoanLifecycleOrchestrator<Arc<InMemoryLoanStore>, LocalInventoryGateway<InMemoryBucketStore>>;

struct Rig {
    engine: Arc<Engine>,
    loans: Orchestrator,
    audit: Arc<InMemoryAuditLog>,
}

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, d).unwrap()
}

fn rig_with(settings: LoanSettings, identity: Option<Arc<dyn IdentityCollaborator>>) -> Rig {
    let audit = Arc::new(InMemoryAuditLog::new());
    let engine = Arc::new(InventoryBucketEngine::new(InMemoryBucketStore::new(), audit.clone()));
    let store = Arc::new(InMemoryLoanStore::new());
    let clock = Arc::new(FixedClock(day(20)));
    let identity: Arc<dyn IdentityCollaborator> = match identity {
        Some(identity) => identity,
        None => Arc::new(BorrowerDirectory::new(Arc::new(LoanQueries::new(store.clone(), clock.clone())))),
    };
    let loans = LoanLifecycleOrchestrator::new(
        store,
        LocalInventoryGateway::new(engine.clone()),
        identity,
        Arc::new(RuntimeSettings::new(settings).unwrap()),
    )
    .with_clock(clock);
    Rig { engine, loans, audit }
}

fn rig() -> Rig {
    rig_with(LoanSettings::default(), Some(Arc::new(AlwaysActive)))
}

impl Rig {
    fn stock(&self, name: &str, amount: i64, reposition_value: i64) -> BucketId {
        self.engine
            .register_stock(
                RegisterStock {
                    name: name.into(),
                    category: "Tools".into(),
                    state: ToolState::Available,
                    amount,
                    reposition_value,
                },
                &ActorId::system(),
            )
            .unwrap()
            .id_typed()
    }

    fn amount(&self, name: &str, state: ToolState) -> i64 {
        self.engine
            .find_ids(name, "Tools", state)
            .unwrap()
            .first()
            .map(|id| self.engine.get(*id).unwrap().amount())
            .unwrap_or(0)
    }

    fn total(&self, name: &str) -> i64 {
        self.engine
            .total_units(&ItemType::parse(name, "Tools").unwrap())
            .unwrap()
    }
}

fn create(borrower: &str, reserved: u32, due: u32, tools: &[BucketId]) -> CreateLoan {
    CreateLoan {
        borrower_id: borrower.into(),
        reservation_date: Some(day(reserved)),
        due_date: Some(day(due)),
        items: tools.iter().copied().map(LoanItemRequest::one).collect(),
    }
}

fn returned_on(d: u32) -> ReturnLoan {
    ReturnLoan {
        actual_return_date: Some(day(d)),
        ..ReturnLoan::default()
    }
}

#[test]
fn create_moves_one_unit_per_item_to_loaned() {
    let rig = rig();
    let hammer = rig.stock("Hammer", 3, 1000);
    let saw = rig.stock("Saw", 1, 4000);

    let loan = rig.loans.create_loan(create("1-9", 1, 4, &[hammer, saw])).unwrap();

    assert!(loan.is_open());
    assert_eq!(loan.total(), 3 * 2500);
    assert_eq!(loan.items()[0].tool_name_snapshot, "Hammer");
    assert_eq!(rig.amount("Hammer", ToolState::Available), 2);
    assert_eq!(rig.amount("Hammer", ToolState::Loaned), 1);
    assert_eq!(rig.amount("Saw", ToolState::Available), 0);
    assert_eq!(rig.amount("Saw", ToolState::Loaned), 1);
    assert_eq!(rig.audit.records().len(), 4);
}

#[test]
fn same_day_loan_bills_one_day() {
    let rig = rig();
    let hammer = rig.stock("Hammer", 1, 1000);
    let loan = rig.loans.create_loan(create("1-9", 5, 5, &[hammer])).unwrap();
    assert_eq!(loan.total(), 2500);
}

#[test]
fn empty_bucket_is_rejected_without_side_effects() {
    let rig = rig();
    let hammer = rig.stock("Hammer", 1, 1000);
    rig.loans.create_loan(create("1-9", 1, 2, &[hammer])).unwrap();

    let err = rig.loans.create_loan(create("2-7", 1, 2, &[hammer])).unwrap_err();
    assert!(matches!(err, DomainError::Validation(m) if m.contains("not enough stock")));

    assert_eq!(rig.amount("Hammer", ToolState::Available), 0);
    assert_eq!(rig.amount("Hammer", ToolState::Loaned), 1);
    assert_eq!(rig.loans.queries().list_all_open().unwrap().len(), 1);
}

#[test]
fn non_available_bucket_is_rejected() {
    let rig = rig();
    let hammer = rig.stock("Hammer", 2, 1000);
    let in_repair = rig
        .engine
        .move_unit(hammer, ToolState::InRepair, &ActorId::system())
        .unwrap()
        .id_typed();

    let err = rig.loans.create_loan(create("1-9", 1, 2, &[in_repair])).unwrap_err();
    assert!(matches!(err, DomainError::Validation(m) if m.contains("not available")));
}

#[test]
fn unknown_tool_is_not_found() {
    let rig = rig();
    let err = rig
        .loans
        .create_loan(create("1-9", 1, 2, &[BucketId::new()]))
        .unwrap_err();
    assert!(matches!(err, DomainError::NotFound(_)));
}

#[test]
fn sixth_open_loan_is_rejected_until_one_is_returned() {
    let rig = rig();
    let tools: Vec<_> = (0..6).map(|i| rig.stock(&format!("Tool {i}"), 1, 100)).collect();

    let mut open = Vec::new();
    for tool in &tools[..5] {
        open.push(rig.loans.create_loan(create("5-5", 1, 3, &[*tool])).unwrap());
    }

    let err = rig.loans.create_loan(create("5-5", 1, 3, &[tools[5]])).unwrap_err();
    assert!(matches!(err, DomainError::Validation(m) if m.contains("5 active loans")));
    assert_eq!(rig.amount("Tool 5", ToolState::Available), 1);

    rig.loans.return_loan(open[0].id_typed(), returned_on(3)).unwrap();
    assert!(rig.loans.create_loan(create("5-5", 1, 3, &[tools[5]])).is_ok());
}

#[test]
fn borrower_cannot_rent_same_item_type_twice_while_open() {
    let rig = rig();
    let hammer = rig.stock("Hammer", 5, 1000);

    let first = rig.loans.create_loan(create("1-9", 1, 3, &[hammer])).unwrap();
    let err = rig.loans.create_loan(create("1-9", 1, 3, &[hammer])).unwrap_err();
    assert!(matches!(err, DomainError::Validation(m) if m.contains("Hammer - Tools")));

    // Another borrower is unaffected.
    rig.loans.create_loan(create("2-7", 1, 3, &[hammer])).unwrap();

    // After returning, the first borrower may rent it again.
    rig.loans.return_loan(first.id_typed(), returned_on(3)).unwrap();
    rig.loans.create_loan(create("1-9", 4, 6, &[hammer])).unwrap();
}

#[test]
fn late_return_is_fined_per_day() {
    let rig = rig();
    let hammer = rig.stock("Hammer", 1, 1000);
    let loan = rig.loans.create_loan(create("1-9", 1, 4, &[hammer])).unwrap();

    let closed = rig
        .loans
        .return_loan(
            loan.id_typed(),
            ReturnLoan { fine_per_day: Some(500), ..returned_on(7) },
        )
        .unwrap();

    assert_eq!(closed.late_fine(), 1500);
    assert!(!closed.late_fine_paid());
    assert_eq!(closed.damage_penalty(), 0);
    assert_eq!(rig.amount("Hammer", ToolState::Available), 1);
    assert_eq!(rig.amount("Hammer", ToolState::Loaned), 0);
}

#[test]
fn on_time_return_has_no_fine() {
    let rig = rig();
    let hammer = rig.stock("Hammer", 1, 1000);
    let loan = rig.loans.create_loan(create("1-9", 1, 4, &[hammer])).unwrap();
    let closed = rig
        .loans
        .return_loan(loan.id_typed(), ReturnLoan { fine_per_day: Some(500), ..returned_on(4) })
        .unwrap();
    assert_eq!(closed.late_fine(), 0);
}

#[test]
fn damage_branch_routes_units_and_prices_them() {
    let rig = rig();
    let hammer = rig.stock("Hammer", 2, 1000);
    let saw = rig.stock("Saw", 2, 4000);
    let drill = rig.stock("Drill", 2, 9000);
    let loan = rig.loans.create_loan(create("1-9", 1, 4, &[hammer, saw, drill])).unwrap();

    // Reposition value changes after the loan was made; the live value counts.
    rig.engine
        .register_stock(
            RegisterStock {
                name: "Drill".into(),
                category: "Tools".into(),
                state: ToolState::Available,
                amount: 1,
                reposition_value: 12000,
            },
            &ActorId::system(),
        )
        .unwrap();

    let closed = rig
        .loans
        .return_loan(
            loan.id_typed(),
            ReturnLoan {
                damaged_tool_ids: [saw].into(),
                irreparable_tool_ids: [drill].into(),
                repair_costs: [(saw, 1500)].into(),
                ..returned_on(4)
            },
        )
        .unwrap();

    assert_eq!(closed.damage_penalty(), 1500 + 12000);
    assert!(!closed.damage_penalty_paid());
    assert_eq!(rig.amount("Hammer", ToolState::Available), 2);
    assert_eq!(rig.amount("Saw", ToolState::InRepair), 1);
    assert_eq!(rig.amount("Saw", ToolState::Loaned), 0);
    assert_eq!(rig.amount("Drill", ToolState::Disposed), 1);
    assert_eq!(rig.amount("Drill", ToolState::Loaned), 0);

    // Loans never create or destroy units.
    assert_eq!(rig.total("Hammer"), 2);
    assert_eq!(rig.total("Saw"), 2);
    assert_eq!(rig.total("Drill"), 3);
}

#[test]
fn damaged_without_cost_adds_nothing() {
    let rig = rig();
    let saw = rig.stock("Saw", 1, 4000);
    let loan = rig.loans.create_loan(create("1-9", 1, 4, &[saw])).unwrap();
    let closed = rig
        .loans
        .return_loan(loan.id_typed(), ReturnLoan { damaged_tool_ids: [saw].into(), ..returned_on(4) })
        .unwrap();
    assert_eq!(closed.damage_penalty(), 0);
    assert_eq!(rig.amount("Saw", ToolState::InRepair), 1);
}

#[test]
fn second_return_is_rejected() {
    let rig = rig();
    let hammer = rig.stock("Hammer", 1, 1000);
    let loan = rig.loans.create_loan(create("1-9", 1, 4, &[hammer])).unwrap();
    rig.loans.return_loan(loan.id_typed(), returned_on(4)).unwrap();

    let err = rig.loans.return_loan(loan.id_typed(), returned_on(5)).unwrap_err();
    assert!(matches!(err, DomainError::Validation(m) if m.contains("already returned")));
    assert_eq!(rig.amount("Hammer", ToolState::Available), 1);
}

#[test]
fn concurrent_returns_leave_other_borrowers_units_loaned() {
    let rig = rig();
    let hammer = rig.stock("Hammer", 2, 1000);
    let a = rig.loans.create_loan(create("1-9", 1, 3, &[hammer])).unwrap();
    let b = rig.loans.create_loan(create("2-7", 1, 3, &[hammer])).unwrap();
    assert_eq!(rig.amount("Hammer", ToolState::Loaned), 2);

    let (loans, a_id) = (&rig.loans, a.id_typed());
    let outcomes: Vec<bool> = std::thread::scope(|s| {
        let handles: Vec<_> = (0..4)
            .map(|_| s.spawn(move || loans.return_loan(a_id, returned_on(3)).is_ok()))
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert_eq!(outcomes.iter().filter(|ok| **ok).count(), 1);
    assert_eq!(rig.amount("Hammer", ToolState::Loaned), 1);
    assert_eq!(rig.amount("Hammer", ToolState::Available), 1);

    rig.loans.return_loan(b.id_typed(), returned_on(3)).unwrap();
    assert_eq!(rig.amount("Hammer", ToolState::Loaned), 0);
    assert_eq!(rig.amount("Hammer", ToolState::Available), 2);
}

#[test]
fn paying_fines_twice_is_idempotent() {
    let rig = rig();
    let hammer = rig.stock("Hammer", 1, 1000);
    let loan = rig.loans.create_loan(create("1-9", 1, 4, &[hammer])).unwrap();
    rig.loans
        .return_loan(
            loan.id_typed(),
            ReturnLoan {
                fine_per_day: Some(100),
                irreparable_tool_ids: [hammer].into(),
                ..returned_on(6)
            },
        )
        .unwrap();

    let pay = PayFines { pay_late_fine: true, pay_damage_penalty: true };
    let once = rig.loans.pay_fines(loan.id_typed(), pay).unwrap();
    let twice = rig.loans.pay_fines(loan.id_typed(), pay).unwrap();

    assert!(once.late_fine_paid() && once.damage_penalty_paid());
    assert_eq!(
        (twice.late_fine_paid(), twice.damage_penalty_paid(), twice.is_open()),
        (true, true, false)
    );
    assert!(rig.loans.queries().list_with_unpaid_debts(&Default::default()).unwrap().is_empty());
}

#[test]
fn paying_zero_fine_leaves_flag_untouched() {
    let rig = rig();
    let hammer = rig.stock("Hammer", 1, 1000);
    let loan = rig.loans.create_loan(create("1-9", 1, 4, &[hammer])).unwrap();
    rig.loans.return_loan(loan.id_typed(), returned_on(4)).unwrap();

    let paid = rig
        .loans
        .pay_fines(loan.id_typed(), PayFines { pay_late_fine: true, pay_damage_penalty: true })
        .unwrap();
    assert!(!paid.late_fine_paid());
    assert!(!paid.damage_penalty_paid());
}

#[test]
fn borrower_with_debt_is_blocked_when_check_enabled() {
    let settings = LoanSettings { check_borrower_active: true, ..LoanSettings::default() };
    let rig = rig_with(settings, None);
    let hammer = rig.stock("Hammer", 3, 1000);
    let saw = rig.stock("Saw", 3, 1000);

    let loan = rig.loans.create_loan(create("1-9", 1, 4, &[hammer])).unwrap();
    rig.loans
        .return_loan(loan.id_typed(), ReturnLoan { fine_per_day: Some(200), ..returned_on(6) })
        .unwrap();

    let err = rig.loans.create_loan(create("1-9", 7, 8, &[saw])).unwrap_err();
    assert!(matches!(err, DomainError::Validation(m) if m.contains("inactive")));

    rig.loans
        .pay_fines(loan.id_typed(), PayFines { pay_late_fine: true, pay_damage_penalty: false })
        .unwrap();
    assert!(rig.loans.create_loan(create("1-9", 7, 8, &[saw])).is_ok());
}

#[test]
fn overdue_listing_uses_clock() {
    let rig = rig();
    let hammer = rig.stock("Hammer", 2, 1000);
    let saw = rig.stock("Saw", 2, 1000);
    let late = rig.loans.create_loan(create("1-9", 1, 10, &[hammer])).unwrap();
    rig.loans.create_loan(create("1-9", 1, 25, &[saw])).unwrap();

    let q = rig.loans.queries();
    let overdue = q.list_overdue(None).unwrap();
    assert_eq!(overdue.len(), 1);
    assert_eq!(overdue[0].id_typed(), late.id_typed());
    assert!(q.has_overdue(&"1-9".parse().unwrap()).unwrap());
}
