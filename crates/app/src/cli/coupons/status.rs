use clap::Args;
use redeem_app::domain::coupons::{
    records::CouponId,
    service::{CouponsManager, CouponsService},
};

#[derive(Debug, Args)]
pub(crate) struct StatusArgs {
    /// Coupon id
    #[arg(long)]
    id: i64,
}

pub(crate) async fn run(coupons: &CouponsManager, args: StatusArgs, status: bool) -> Result<(), String> {
    coupons
        .set_status(CouponId::new(args.id), status)
        .await
        .map_err(|error| format!("failed to update coupon {}: {error}", args.id))?;

    println!(
        "coupon {} {}",
        args.id,
        if status { "enabled" } else { "disabled" }
    );

    Ok(())
}
