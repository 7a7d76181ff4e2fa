use clap::Args;
use redeem::pricing::round_price;
use redeem_app::domain::coupons::{
    query::CouponQuery,
    records::CouponSummary,
    service::{CouponsManager, CouponsService},
};

#[derive(Debug, Args)]
pub(crate) struct ListCouponsArgs {
    /// Case-sensitive code substring
    #[arg(long)]
    code: Option<String>,

    #[arg(long, default_value_t = 0)]
    offset: u64,

    #[arg(long)]
    limit: Option<u64>,
}

fn format_summary(coupon: &CouponSummary) -> String {
    let value = coupon
        .discount
        .value()
        .map_or_else(|| "-".to_string(), |value| round_price(value).to_string());

    format!(
        "{id}\t{code}\t{kind}\t{discount} {value}\t{state}\t{start} .. {end}",
        id = coupon.id.into_i64(),
        code = coupon.code.as_str(),
        kind = coupon.coupon_type.as_str(),
        discount = coupon.discount.discount_type().as_str(),
        state = if coupon.status { "enabled" } else { "disabled" },
        start = coupon.validity.start(),
        end = coupon.validity.end(),
    )
}

pub(crate) async fn run(coupons: &CouponsManager, args: ListCouponsArgs) -> Result<(), String> {
    let page = coupons
        .search_coupons(CouponQuery {
            code: args.code,
            offset: args.offset,
            limit: args.limit,
        })
        .await
        .into_result()
        .map_err(|error| format!("failed to list coupons: {error}"))?;

    if page.items.is_empty() {
        println!("no coupons found");
        return Ok(());
    }

    for coupon in &page.items {
        println!("{}", format_summary(coupon));
    }

    println!(
        "showing {} of {} (offset {})",
        page.items.len(),
        page.total,
        page.offset
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use jiff::Timestamp;
    use redeem::{
        conditions::UsageConditions,
        coupons::{CouponCode, CouponType, ValidityWindow},
        discounts::Discount,
    };
    use redeem_app::domain::coupons::records::{CouponId, CouponRecord};
    use rust_decimal_macros::dec;
    use testresult::TestResult;

    use super::*;

    #[test]
    fn summaries_render_on_one_line() -> TestResult {
        let coupon = CouponRecord {
            id: CouponId::new(12),
            code: CouponCode::parse("SAVE5")?,
            coupon_type: CouponType::Manual,
            description: None,
            status: false,
            discount: Discount::fixed(dec!(5.00))?,
            validity: ValidityWindow::new(
                "2026-01-01T00:00:00Z".parse::<Timestamp>()?,
                "2026-02-01T00:00:00Z".parse::<Timestamp>()?,
            )?,
            usage: UsageConditions::default(),
            created_at: Timestamp::UNIX_EPOCH,
        };

        assert_eq!(
            format_summary(&coupon),
            "12\tSAVE5\tmanual\tfixed 5.00\tdisabled\t2026-01-01T00:00:00Z .. 2026-02-01T00:00:00Z"
        );

        Ok(())
    }
}
