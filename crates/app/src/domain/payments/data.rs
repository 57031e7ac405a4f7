//! Payment Data

use crate::domain::{
    coupons::records::AppliedCoupon,
    payments::records::{GatewayReference, PaymentMethod, PaymentUuid},
    users::records::UserUuid,
};

/// New Payment Data
#[derive(Debug, Clone, PartialEq)]
pub struct NewPayment {
    pub uuid: PaymentUuid,
    pub user_uuid: UserUuid,
    pub method: PaymentMethod,
    pub total_amount: u64,
    pub coupon: Option<AppliedCoupon>,
    pub gateway: Option<GatewayReference>,
}
