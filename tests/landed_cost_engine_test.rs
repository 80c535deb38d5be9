// ==========================================
// 到岸成本汇总引擎集成测试
// ==========================================
// 测试目标: 到岸成本公式、基准与报价系数一致、不可用哨兵、最低价稳定排序
// ==========================================


use landed_award::domain::types::{Awardable, Round, SupplierId};
use rust_decimal_macros::dec;
use test_helpers::{r2, ScenarioBuilder};

#[test]
fn test_standard_division_sums_all_multipliers() {
    let scenario = ScenarioBuilder::new()
        .supplier("Alpha", "NINGBO")
        .part("1", Some("Alpha"), Some(dec!(10)), dec!(1000), &[r2("Alpha", dec!(10))])
        .build();
    let sheet = scenario.consolidate();
    let row = sheet.get("1").unwrap();

    // 10 × (运费 0.05 + 关税 0.10)
    let alpha = row.quote(&SupplierId::from("Alpha")).unwrap();
    assert_eq!(alpha.landed, Some(dec!(1.5)));
    assert_eq!(alpha.country.as_deref(), Some("China"));
    assert!(!alpha.tariff_defaulted);
}

#[test]
fn test_exempt_division_uses_freight_only() {
    let scenario = ScenarioBuilder::new()
        .supplier("Alpha", "NINGBO")
        .part_in("Buchanan", "1", Some("Alpha"), Some(dec!(10)), dec!(1000), &[r2("Alpha", dec!(10))])
        .build();
    let sheet = scenario.consolidate();
    let alpha = sheet.get("1").unwrap().quote(&SupplierId::from("Alpha")).unwrap();

    assert_eq!(alpha.landed, Some(dec!(0.5)));
    assert!(!alpha.tariff_defaulted);
}

#[test]
fn test_benchmark_and_bid_share_multipliers() {
    let scenario = ScenarioBuilder::new()
        .supplier("Alpha", "NINGBO")
        .supplier("Beta", "MUMBAI")
        .part(
            "1",
            Some("Alpha"),
            Some(dec!(10)),
            dec!(1000),
            &[r2("Alpha", dec!(10)), r2("Beta", dec!(12))],
        )
        .build();
    let sheet = scenario.consolidate();
    let row = sheet.get("1").unwrap();

    // 现供应商按基准价报价 → 基准到岸与报价到岸一致
    let alpha = row.quote(&SupplierId::from("Alpha")).unwrap();
    assert_eq!(row.benchmark_landed, alpha.landed);
    assert_eq!(row.landed_extended_cost, Some(dec!(1500)));
    assert_eq!(alpha.landed_savings_pct, Some(dec!(0)));

    // Beta: 12 × 0.10 = 1.2，节约 (1.5 − 1.2) / 1.5 = 0.2
    let beta = row.quote(&SupplierId::from("Beta")).unwrap();
    assert_eq!(beta.landed, Some(dec!(1.2)));
    assert_eq!(beta.landed_savings_pct, Some(dec!(0.2)));
    assert_eq!(beta.landed_savings_usd, Some(dec!(300)));
    // FOB 口径: (10 − 12) / 10
    assert_eq!(beta.fob_savings_pct, Some(dec!(-0.2)));
}

#[test]
fn test_missing_benchmark_is_unavailable_everywhere() {
    let scenario = ScenarioBuilder::new()
        .supplier("Alpha", "NINGBO")
        .supplier("Beta", "MUMBAI")
        .part("1", None, None, dec!(1000), &[r2("Alpha", dec!(10)), r2("Beta", dec!(9))])
        .part("2", Some("Alpha"), Some(dec!(0)), dec!(1000), &[r2("Alpha", dec!(10))])
        .build();
    let sheet = scenario.consolidate();

    for row_id in ["1", "2"] {
        let row = sheet.get(row_id).unwrap();
        assert!(!row.has_baseline(), "row {}", row_id);
        assert_eq!(row.fob.awardable(), Awardable::NoBaseline);
        assert_eq!(row.landed.awardable(), Awardable::NoBaseline);
        assert!(row.fob.savings_pct.is_none());
        assert!(row.landed.savings_usd.is_none());
        assert!(row.as_is.final_landed_pct.is_none());
        for quote in &row.quotes {
            assert!(quote.fob_savings_pct.is_none());
            assert!(quote.fob_savings_usd.is_none());
            assert!(quote.landed_savings_pct.is_none());
            assert!(quote.landed_savings_usd.is_none());
        }
    }
    // 最低价仍然可算
    let row = sheet.get("1").unwrap();
    assert_eq!(row.landed.min.as_ref().unwrap().supplier.as_str(), "Beta");
}

#[test]
fn test_min_bid_tie_keeps_supplier_order() {
    // Alpha: 10 × 0.15 = 1.5；Beta: 15 × 0.10 = 1.5
    let bids = [r2("Alpha", dec!(10)), r2("Beta", dec!(15))];

    let forward = ScenarioBuilder::new()
        .supplier("Alpha", "NINGBO")
        .supplier("Beta", "MUMBAI")
        .part("1", None, Some(dec!(20)), dec!(10), &bids)
        .build()
        .consolidate();
    let row = forward.get("1").unwrap();
    assert_eq!(row.landed.min.as_ref().unwrap().supplier.as_str(), "Alpha");
    assert_eq!(row.landed.second.as_ref().unwrap().supplier.as_str(), "Beta");

    let reversed = ScenarioBuilder::new()
        .supplier("Beta", "MUMBAI")
        .supplier("Alpha", "NINGBO")
        .part("1", None, Some(dec!(20)), dec!(10), &bids)
        .build()
        .consolidate();
    let row = reversed.get("1").unwrap();
    assert_eq!(row.landed.min.as_ref().unwrap().supplier.as_str(), "Beta");
}

#[test]
fn test_r1_fallback_when_r2_missing_or_zero() {
    let scenario = ScenarioBuilder::new()
        .supplier("Alpha", "NINGBO")
        .supplier("Beta", "MUMBAI")
        .part(
            "1",
            None,
            Some(dec!(20)),
            dec!(10),
            &[("Alpha", Some(dec!(8)), Some(dec!(0))), ("Beta", Some(dec!(30)), Some(dec!(9)))],
        )
        .build();
    let sheet = scenario.consolidate();
    let row = sheet.get("1").unwrap();

    let alpha = row.quote(&SupplierId::from("Alpha")).unwrap();
    assert_eq!(alpha.round, Round::R1);
    assert_eq!(alpha.fob, dec!(8));
    let beta = row.quote(&SupplierId::from("Beta")).unwrap();
    assert_eq!(beta.round, Round::R2);

    // FOB 最低价来自生效报价集合
    assert_eq!(row.fob.min.as_ref().unwrap().value, dec!(8));
    assert_eq!(row.r1_min.as_ref().unwrap().value, dec!(8));
}

#[test]
fn test_missing_port_makes_quote_unavailable_not_fatal() {
    let mut scenario = ScenarioBuilder::new()
        .supplier("Alpha", "NINGBO")
        .part("1", Some("Alpha"), Some(dec!(10)), dec!(10), &[r2("Alpha", dec!(10)), r2("Ghost", dec!(1))])
        .build();
    scenario.sheet.suppliers.push(SupplierId::from("Ghost"));
    let sheet = scenario.consolidate();
    let row = sheet.get("1").unwrap();

    let ghost = row.quote(&SupplierId::from("Ghost")).unwrap();
    assert!(ghost.landed.is_none());
    assert!(ghost.landed_savings_pct.is_none());
    // 不可用报价不参与到岸最低价
    assert_eq!(row.landed.min.as_ref().unwrap().supplier.as_str(), "Alpha");
    assert_eq!(row.fob.min.as_ref().unwrap().supplier.as_str(), "Ghost");
}
