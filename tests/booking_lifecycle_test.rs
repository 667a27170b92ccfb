mod common;

use chrono::NaiveDate;
use common::{add_service, add_user, market};
use decor_booking::application::Marketplace;
use decor_booking::domain::booking::{
    Booking, BookingFilter, BookingPatch, BookingStatus, NewBooking, PaymentStatus,
};
use decor_booking::domain::decorator::Decorator;
use decor_booking::domain::payment::IntentStatus;
use decor_booking::domain::record::{Collection, Filter};
use decor_booking::domain::user::Role;
use decor_booking::error::ErrorKind;
use rust_decimal_macros::dec;
use std::time::Duration;
use tokio::time::sleep;

async fn book(market: &Marketplace, email: &str, service_id: decor_booking::domain::record::RecordId) -> Booking {
    market
        .bookings
        .create_booking(NewBooking {
            user_id: email.to_string(),
            service_id,
            booking_date: NaiveDate::from_ymd_opt(2026, 12, 20).unwrap(),
            event_location: "Dhaka".to_string(),
            mobile_number: "01700000000".to_string(),
        })
        .await
        .unwrap()
}

async fn decorator_for(market: &Marketplace, email: &str) -> Decorator {
    let user = add_user(market, email, "Mim", Role::User).await;
    market
        .provisioning
        .set_user_role(user.id, Role::Decorator)
        .await
        .unwrap();
    market
        .records
        .find_one(Collection::Decorators, &Filter::all().with("userId", email))
        .await
        .unwrap()
        .unwrap()
}

#[tokio::test]
async fn test_book_assign_pay_complete() {
    let market = market();
    let service = add_service(&market, "Wedding Stage Decoration", dec!(50000)).await;
    let decorator = decorator_for(&market, "mim@live.com").await;

    let booking = book(&market, "tuba@live.com", service.id).await;
    assert_eq!(booking.status, BookingStatus::Pending);
    assert_eq!(booking.payment_status, PaymentStatus::Unpaid);
    assert_eq!(booking.cost, dec!(50000));
    assert_eq!(booking.service_name, "Wedding Stage Decoration");

    let assigned = market
        .bookings
        .update_booking(
            booking.id,
            BookingPatch {
                status: Some(BookingStatus::Assigned),
                assigned_decorator_id: Some(decorator.id),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(assigned.status, BookingStatus::Assigned);
    assert_eq!(assigned.assigned_decorator_name.as_deref(), Some("Mim"));

    let intent = market.bookings.initiate_payment(booking.cost).await.unwrap();
    assert_eq!(intent.amount_minor, 5_000_000);
    assert_eq!(intent.currency, "usd");
    assert_eq!(intent.status, IntentStatus::RequiresPaymentMethod);

    let payment = market
        .bookings
        .record_payment(booking.id, &intent.intent_id, "card")
        .await
        .unwrap();
    let paid = market
        .bookings
        .update_booking(
            booking.id,
            BookingPatch {
                payment_status: Some(PaymentStatus::Paid),
                transaction_id: Some(payment.transaction_id.clone()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(paid.payment_status, PaymentStatus::Paid);
    assert_eq!(paid.transaction_id.as_deref(), Some(intent.intent_id.as_str()));

    let completed = market
        .bookings
        .update_booking(
            booking.id,
            BookingPatch {
                status: Some(BookingStatus::Completed),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(completed.status, BookingStatus::Completed);
    assert_eq!(completed.payment_status, PaymentStatus::Paid);

    let err = market
        .bookings
        .update_booking(
            booking.id,
            BookingPatch {
                status: Some(BookingStatus::Cancelled),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::FailedPrecondition);
}

#[tokio::test]
async fn test_empty_patch_is_invalid() {
    let market = market();
    let service = add_service(&market, "Birthday Party", dec!(15000)).await;
    let booking = book(&market, "tuba@live.com", service.id).await;

    let err = market
        .bookings
        .update_booking(booking.id, BookingPatch::default())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);

    let unchanged = market.bookings.get_booking(booking.id).await.unwrap();
    assert_eq!(unchanged, booking);
}

#[tokio::test]
async fn test_mismatched_transaction_is_rejected() {
    let market = market();
    let service = add_service(&market, "Birthday Party", dec!(15000)).await;
    let booking = book(&market, "tuba@live.com", service.id).await;
    let intent = market.bookings.initiate_payment(booking.cost).await.unwrap();
    market
        .bookings
        .record_payment(booking.id, &intent.intent_id, "card")
        .await
        .unwrap();

    let err = market
        .bookings
        .update_booking(
            booking.id,
            BookingPatch {
                payment_status: Some(PaymentStatus::Paid),
                transaction_id: Some("pi_forged".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::FailedPrecondition);
}

#[tokio::test]
async fn test_list_bookings_filters_and_orders() {
    let market = market();
    let service = add_service(&market, "Birthday Party", dec!(15000)).await;
    let decorator = decorator_for(&market, "mim@live.com").await;

    let first = book(&market, "tuba@live.com", service.id).await;
    sleep(Duration::from_millis(5)).await;
    let second = book(&market, "tuba@live.com", service.id).await;
    book(&market, "rabbi@live.com", service.id).await;

    market
        .bookings
        .update_booking(
            first.id,
            BookingPatch {
                assigned_decorator_id: Some(decorator.id),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let mine = market
        .bookings
        .list_bookings(&BookingFilter {
            user_id: Some("tuba@live.com".to_string()),
            assigned_decorator_id: None,
        })
        .await
        .unwrap();
    let ids: Vec<_> = mine.iter().map(|b| b.id).collect();
    assert_eq!(ids, vec![second.id, first.id]);

    let assigned = market
        .bookings
        .list_bookings(&BookingFilter {
            user_id: None,
            assigned_decorator_id: Some(decorator.id),
        })
        .await
        .unwrap();
    assert_eq!(assigned.len(), 1);
    assert_eq!(assigned[0].id, first.id);

    let all = market
        .bookings
        .list_bookings(&BookingFilter::default())
        .await
        .unwrap();
    assert_eq!(all.len(), 3);
}
