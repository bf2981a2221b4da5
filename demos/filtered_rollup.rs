use campaign_reconciler::*;
use chrono::NaiveDate;

const SPEND: &str = "\
Ad set name,Day,Amount spent (USD),Cost per result
Summer Promo (42),2024-01-05,100,2.50
Summer Promo (42),2024-01-06,80,2.10
Winter Sale (7),2024-01-05,40.25,1.10
Winter Sale (7),2024-01-06,12.50,0.90
Retarget Broad (19),2024-01-05,60,3.00
Evergreen (3),2024-01-07,9.99,
Untitled ad set,2024-01-05,5,
";

const REVENUE: &str = "\
campid,date,clicks,estimated_earnings
42,2024-01-05,10,150
42,2024-01-05,5,50
42,2024-01-06,9,71.20
7,2024-01-05,13,0.60
19,2024-01-05,20,33.30
3,2024-01-07,0,4.00
";

fn main() {
    println!("Campaign profit/loss, 5-6 January only\n");

    let options = ReconcileOptions {
        filter: FilterSpec {
            date_from: NaiveDate::from_ymd_opt(2024, 1, 5),
            date_to: NaiveDate::from_ymd_opt(2024, 1, 6),
            ..FilterSpec::default()
        },
        top_n: 2,
        bottom_n: 2,
        ..ReconcileOptions::default()
    };

    let report = match reconcile_csv(&[SPEND], &[REVENUE], &options) {
        Ok(report) => report,
        Err(e) => {
            eprintln!("reconciliation failed: {e}");
            std::process::exit(1);
        }
    };

    for row in &report.rows {
        println!(
            "  {} {:>4} {:<22} spend {:>8.2} revenue {:>8.2} rpc {:>6.2} p/l {:>8.2}",
            row.date.format("%b %d"),
            row.campaign_id,
            row.campaign_name,
            row.spend,
            row.revenue,
            row.rpc,
            row.profit_loss
        );
    }

    println!("\nTop campaigns:");
    for rollup in &report.ranking.top {
        println!("  {:>4}  p/l {:>8.2}", rollup.campaign_id, rollup.profit_loss);
    }

    println!("\nBottom campaigns:");
    for rollup in &report.ranking.bottom {
        println!("  {:>4}  p/l {:>8.2}", rollup.campaign_id, rollup.profit_loss);
    }

    println!(
        "\nExcluded {} row(s); campaigns available for selection: {:?}",
        report.diagnostics.excluded_count,
        report.campaign_ids()
    );
}
