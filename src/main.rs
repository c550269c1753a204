use anyhow::Result;
use serde_json::json;

use rentalcashflow::{
    build_report, RecalcController, Transport, TransportError,
};

fn main() -> Result<()> {
    println!("🏠 Rental Cashflow Analysis - Field Resolution Demo");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    // 1. Select a property and load its snapshot
    println!("\n📸 Loading property snapshot...");
    let mut controller = RecalcController::new();
    controller.set_active_property("demo-property");
    controller.install_snapshot(&sample_snapshot())?;
    println!("✓ Snapshot installed for 'demo-property'");

    // 2. Render the full report
    println!("\n📋 Property report:");
    print_report(&controller);

    // 3. Record an edit and recalculate against a local transport
    println!("\n✏️  Editing Vacancy Rate to 8%...");
    controller.set_pending_edit("Vacancy Rate", "8")?;
    println!(
        "✓ Pending edit recorded ({} unsaved)",
        controller.pending_edits().len()
    );

    println!("\n🔄 Recalculating...");
    let transport = LocalRecalc;
    let applied = controller.submit_recalculation(&transport)?;
    println!("✓ Recalculation applied: {}", applied);

    println!("\n📋 Updated report:");
    print_report(&controller);

    println!("\n━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("🎉 Demo complete");

    Ok(())
}

fn print_report(controller: &RecalcController) {
    let Some(snapshot) = controller.snapshot() else {
        println!("    (no snapshot loaded)");
        return;
    };
    let report = build_report(controller.registry(), snapshot, controller.pending_edits());

    for section in &report {
        println!("\n  {}", section.name);
        for line in &section.lines {
            println!("    {:<42} {:>18}", line.display_name, line.value);
        }
    }
}

/// Stand-in calculation service: echoes the submitted values back as the
/// new snapshot with a couple of recomputed metrics.
struct LocalRecalc;

impl Transport for LocalRecalc {
    fn recalculate(
        &self,
        _property_id: &str,
        payload: &serde_json::Value,
    ) -> Result<serde_json::Value, TransportError> {
        let values = &payload["values"];
        let gross = values["grossRents"].as_f64().unwrap_or(0.0);
        let vacancy = values["vacancyRate"].as_f64().unwrap_or(0.0);
        let effective = gross * (1.0 - vacancy);

        Ok(json!({
            "sourcedFacts": {
                "address": values["address"],
                "fairMarketValue": values["fairMarketValue"],
                "numberOfUnits": values["numberOfUnits"],
                "offerPrice": values["offerPrice"],
                "firstMtgInterestRate": values["firstMtgInterestRate"],
                "grossRents": values["grossRents"],
                "propertyTaxes": values["propertyTaxes"],
                "insurance": values["insurance"],
                "associationFees": values["associationFees"]
            },
            "userInputs": values,
            "derivedMetrics": {
                "totalIncome": gross,
                "vacancyLossPercentage": gross * vacancy,
                "effectiveGrossIncome": effective
            },
            "cashflowPerUnit": 0.0
        }))
    }

    fn save_user_inputs(&self, _payload: &serde_json::Value) -> Result<(), TransportError> {
        Ok(())
    }

    fn save_property(&self, _payload: &serde_json::Value) -> Result<(), TransportError> {
        Ok(())
    }
}

fn sample_snapshot() -> serde_json::Value {
    json!({
        "sourcedFacts": {
            "address": "12 Oak St, Albany, NY 12203",
            "fairMarketValue": 450000,
            "numberOfUnits": 2,
            "offerPrice": 440000,
            "firstMtgInterestRate": 0.065,
            "grossRents": 48000,
            "propertyTaxes": 5400,
            "insurance": 1800,
            "associationFees": 2400
        },
        "userInputs": {
            "vacancyRate": 0.05,
            "managementRate": 0.10,
            "waterSewer": 100.0,
            "inspections": 1300.0
        },
        "derivedMetrics": {
            "totalIncome": 48000.0,
            "effectiveGrossIncome": 45600.0,
            "netOperatingIncome": 21500.0,
            "cashflowPerUnitPerMonth": 118.25
        },
        "cashflowPerUnit": 118.25
    })
}
