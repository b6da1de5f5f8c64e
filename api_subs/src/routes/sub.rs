use actix_web::{Responder, get, web};
use common::{error::Res, http::Success};

use crate::{dtos::pay::SubscriptionPlansResponse, models::sub::PriceTable};

/// Lists the paid tiers and the price ids used to buy them.
#[get("/plans")]
async fn get_plans(prices: web::Data<PriceTable>) -> Res<impl Responder> {
    Success::ok(SubscriptionPlansResponse {
        plans: prices.plans(),
    })
}
