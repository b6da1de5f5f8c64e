use actix_web::web::{self};

pub mod routes {
    pub mod pay;
    pub mod sub;
}

pub mod services {
    pub mod pay;
    pub mod webhook;
}

pub mod dtos {
    pub mod pay;
}

pub mod models {
    pub mod event;
    pub mod sub;
}

pub mod misc {
    pub mod signature;
}

pub fn mount_subs() -> actix_web::Scope {
    web::scope("/sub").service(routes::sub::get_plans)
}
pub fn mount_pay() -> actix_web::Scope {
    web::scope("/pay").service(routes::pay::post_checkout)
}
pub fn mount_webhook() -> actix_web::Scope {
    web::scope("/pay").service(routes::pay::post_webhook)
}
