use std::sync::Arc;

use chrono::{Duration, Utc};
use uuid::Uuid;

use vetdesk_db::model::appointment::AppointmentStatus;
use vetdesk_db::store::memory::MemoryStore;

use crate::error::ServiceError;
use crate::scheduling::{
    AppointmentQuery, CreateAppointmentRequest, Scheduler, UpdateAppointmentRequest,
};

fn scheduler() -> Scheduler {
    Scheduler::new(Arc::new(MemoryStore::new()))
}

fn booking(pet: Uuid, vet: Option<Uuid>, date: &str) -> CreateAppointmentRequest {
    CreateAppointmentRequest {
        pet_id: Some(pet),
        customer_id: Some(Uuid::now_v7()),
        veterinarian_id: vet,
        appointment_date: Some(date.to_string()),
        appointment_type: Some("checkup".to_string()),
        status: None,
        notes: None,
    }
}

#[test_log::test(tokio::test)]
async fn double_booking_is_rejected_per_vet_and_per_pet() {
    let scheduler = scheduler();
    let (p1, p2) = (Uuid::now_v7(), Uuid::now_v7());
    let (v1, v2) = (Uuid::now_v7(), Uuid::now_v7());
    let at = "2025-06-01T09:00:00Z";

    scheduler
        .create(booking(p1, Some(v1), at))
        .await
        .expect("first booking succeeds");

    let err = scheduler
        .create(booking(p2, Some(v1), at))
        .await
        .expect_err("same vet, same instant");
    assert!(matches!(err, ServiceError::VeterinarianSlotConflict));

    let err = scheduler
        .create(booking(p1, Some(v2), at))
        .await
        .expect_err("same pet, same instant, different vet");
    assert!(matches!(err, ServiceError::PetSlotConflict));
}

#[test_log::test(tokio::test)]
async fn conflicts_use_exact_instant_not_overlap() {
    let scheduler = scheduler();
    let vet = Uuid::now_v7();

    scheduler
        .create(booking(Uuid::now_v7(), Some(vet), "2025-06-01T09:00:00Z"))
        .await
        .expect("09:00 booking succeeds");

    // One minute apart is not a conflict.
    scheduler
        .create(booking(Uuid::now_v7(), Some(vet), "2025-06-01T09:01:00Z"))
        .await
        .expect("09:01 booking succeeds");
}

#[test_log::test(tokio::test)]
async fn equivalent_date_spellings_hit_the_same_slot() {
    let scheduler = scheduler();
    let vet = Uuid::now_v7();

    scheduler
        .create(booking(Uuid::now_v7(), Some(vet), "2025-06-01T09:00:00Z"))
        .await
        .expect("booking succeeds");

    let err = scheduler
        .create(booking(
            Uuid::now_v7(),
            Some(vet),
            "2025-06-01T09:00:00.000Z",
        ))
        .await
        .expect_err("fractional-second spelling of the same instant conflicts");
    assert!(matches!(err, ServiceError::VeterinarianSlotConflict));
}

#[test_log::test(tokio::test)]
async fn cancelled_appointment_frees_its_slot() {
    let scheduler = scheduler();
    let vet = Uuid::now_v7();
    let at = "2025-06-01T09:00:00Z";

    let first = scheduler
        .create(booking(Uuid::now_v7(), Some(vet), at))
        .await
        .expect("booking succeeds");

    scheduler
        .update(
            first.id,
            UpdateAppointmentRequest {
                status: Some("cancelled".to_string()),
                ..UpdateAppointmentRequest::default()
            },
        )
        .await
        .expect("cancel succeeds");

    scheduler
        .create(booking(Uuid::now_v7(), Some(vet), at))
        .await
        .expect("slot is free after cancellation");
}

#[test_log::test(tokio::test)]
async fn reschedule_within_lockout_window_is_rejected() {
    let scheduler = scheduler();
    let soon = (Utc::now() + Duration::minutes(30)).to_rfc3339();
    let later = (Utc::now() + Duration::hours(3)).to_rfc3339();

    let appointment = scheduler
        .create(booking(Uuid::now_v7(), None, &soon))
        .await
        .expect("booking succeeds");

    let err = scheduler
        .update(
            appointment.id,
            UpdateAppointmentRequest {
                appointment_date: Some(later),
                ..UpdateAppointmentRequest::default()
            },
        )
        .await
        .expect_err("moving an appointment 30 minutes out is locked");
    assert!(matches!(err, ServiceError::LockoutWindowViolation));
}

#[test_log::test(tokio::test)]
async fn reschedule_outside_lockout_window_succeeds() {
    let scheduler = scheduler();
    let in_two_hours = (Utc::now() + Duration::hours(2)).to_rfc3339();
    let in_three_hours = (Utc::now() + Duration::hours(3)).to_rfc3339();

    let appointment = scheduler
        .create(booking(Uuid::now_v7(), None, &in_two_hours))
        .await
        .expect("booking succeeds");

    let updated = scheduler
        .update(
            appointment.id,
            UpdateAppointmentRequest {
                appointment_date: Some(in_three_hours),
                ..UpdateAppointmentRequest::default()
            },
        )
        .await
        .expect("reschedule two hours out succeeds");
    assert_ne!(updated.appointment_date, appointment.appointment_date);
}

#[test_log::test(tokio::test)]
async fn status_change_bypasses_lockout() {
    let scheduler = scheduler();
    let soon = (Utc::now() + Duration::minutes(10)).to_rfc3339();

    let appointment = scheduler
        .create(booking(Uuid::now_v7(), None, &soon))
        .await
        .expect("booking succeeds");

    let updated = scheduler
        .update(
            appointment.id,
            UpdateAppointmentRequest {
                status: Some("confirmed".to_string()),
                notes: Some("owner called ahead".to_string()),
                ..UpdateAppointmentRequest::default()
            },
        )
        .await
        .expect("status and notes can change inside the window");
    assert_eq!(updated.status, AppointmentStatus::Confirmed);
}

#[test_log::test(tokio::test)]
async fn resubmitting_the_current_date_bypasses_lockout() {
    let scheduler = scheduler();
    let soon = (Utc::now() + Duration::minutes(10)).to_rfc3339();

    let appointment = scheduler
        .create(booking(Uuid::now_v7(), None, &soon))
        .await
        .expect("booking succeeds");

    // Clients resend the whole form; an unchanged date is not a reschedule.
    let updated = scheduler
        .update(
            appointment.id,
            UpdateAppointmentRequest {
                appointment_date: Some(appointment.appointment_date.to_rfc3339()),
                status: Some("confirmed".to_string()),
                ..UpdateAppointmentRequest::default()
            },
        )
        .await
        .expect("unchanged date is not locked");
    assert_eq!(updated.appointment_date, appointment.appointment_date);
}

#[test_log::test(tokio::test)]
async fn create_validates_required_fields_and_formats() {
    let scheduler = scheduler();

    let err = scheduler
        .create(CreateAppointmentRequest {
            customer_id: Some(Uuid::now_v7()),
            appointment_date: Some("2025-06-01T09:00:00Z".to_string()),
            appointment_type: Some("checkup".to_string()),
            ..CreateAppointmentRequest::default()
        })
        .await
        .expect_err("petId is required");
    assert_eq!(err.field(), Some("petId"));

    let err = scheduler
        .create(booking(Uuid::now_v7(), None, "sometime tomorrow"))
        .await
        .expect_err("unparseable date");
    assert_eq!(err.field(), Some("appointmentDate"));
    assert_eq!(err.kind(), "validation_error");

    let mut request = booking(Uuid::now_v7(), None, "2025-06-01T09:00:00Z");
    request.status = Some("rescheduled".to_string());
    let err = scheduler
        .create(request)
        .await
        .expect_err("unknown status name");
    assert_eq!(err.field(), Some("status"));
}

#[test_log::test(tokio::test)]
async fn unknown_appointment_id_is_not_found() {
    let scheduler = scheduler();

    let err = scheduler
        .get(Uuid::now_v7())
        .await
        .expect_err("nothing booked");
    assert!(matches!(err, ServiceError::NotFound(_)));

    let err = scheduler
        .update(Uuid::now_v7(), UpdateAppointmentRequest::default())
        .await
        .expect_err("nothing to update");
    assert!(matches!(err, ServiceError::NotFound(_)));
}

#[test_log::test(tokio::test)]
async fn list_orders_ascending_and_filters_by_day_and_status() {
    let scheduler = scheduler();
    let pet = Uuid::now_v7();

    // Naive local datetimes keep the day filter independent of the host zone.
    let afternoon = scheduler
        .create(booking(pet, None, "2025-06-01T15:00"))
        .await
        .expect("afternoon booking");
    let morning = scheduler
        .create(booking(Uuid::now_v7(), None, "2025-06-01T09:00"))
        .await
        .expect("morning booking");
    scheduler
        .create(booking(Uuid::now_v7(), None, "2025-06-02T12:00"))
        .await
        .expect("next-day booking");

    let day = scheduler
        .list(AppointmentQuery {
            date: Some("2025-06-01".to_string()),
            status: None,
        })
        .await
        .expect("list succeeds");
    assert_eq!(
        day.iter().map(|a| a.id).collect::<Vec<_>>(),
        vec![morning.id, afternoon.id]
    );

    scheduler
        .update(
            afternoon.id,
            UpdateAppointmentRequest {
                status: Some("urgent".to_string()),
                ..UpdateAppointmentRequest::default()
            },
        )
        .await
        .expect("status change succeeds");

    let urgent = scheduler
        .list(AppointmentQuery {
            date: None,
            status: Some("urgent".to_string()),
        })
        .await
        .expect("list succeeds");
    assert_eq!(urgent.len(), 1);
    assert_eq!(urgent[0].id, afternoon.id);

    // An unknown status name simply matches nothing.
    let none = scheduler
        .list(AppointmentQuery {
            date: None,
            status: Some("banana".to_string()),
        })
        .await
        .expect("list succeeds");
    assert!(none.is_empty());
}

#[test_log::test(tokio::test)]
async fn unparseable_date_filter_is_ignored() {
    let scheduler = scheduler();
    scheduler
        .create(booking(Uuid::now_v7(), None, "2025-06-01T09:00:00Z"))
        .await
        .expect("booking succeeds");

    let all = scheduler
        .list(AppointmentQuery {
            date: Some("not-a-date".to_string()),
            status: None,
        })
        .await
        .expect("list succeeds despite the bad filter");
    assert_eq!(all.len(), 1);
}

#[test_log::test(tokio::test)]
async fn get_is_idempotent_between_writes() {
    let scheduler = scheduler();

    let mut request = booking(Uuid::now_v7(), Some(Uuid::now_v7()), "2025-06-01T09:00:00Z");
    request.notes = Some("first visit".to_string());
    let created = scheduler.create(request).await.expect("booking succeeds");

    let first = scheduler.get(created.id).await.expect("first read");
    let second = scheduler.get(created.id).await.expect("second read");
    assert_eq!(first, second);
    assert_eq!(first, created);
}

#[test_log::test(tokio::test)]
async fn notes_are_trimmed_to_none_when_blank() {
    let scheduler = scheduler();

    let mut request = booking(Uuid::now_v7(), None, "2025-06-01T09:00:00Z");
    request.notes = Some("   ".to_string());
    let created = scheduler.create(request).await.expect("booking succeeds");
    assert_eq!(created.notes, None);
    assert_eq!(created.status, AppointmentStatus::Pending);

    // A whitespace-only notes patch must not overwrite stored notes.
    scheduler
        .update(
            created.id,
            UpdateAppointmentRequest {
                notes: Some("owner called ahead".to_string()),
                ..UpdateAppointmentRequest::default()
            },
        )
        .await
        .expect("notes update succeeds");
    let updated = scheduler
        .update(
            created.id,
            UpdateAppointmentRequest {
                notes: Some("   ".to_string()),
                ..UpdateAppointmentRequest::default()
            },
        )
        .await
        .expect("blank notes update succeeds");
    assert_eq!(updated.notes.as_deref(), Some("owner called ahead"));
}
