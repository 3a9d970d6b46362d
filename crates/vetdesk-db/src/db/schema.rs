diesel::table! {
    appointment (id) {
        id -> Uuid,
        pet_id -> Uuid,
        customer_id -> Uuid,
        veterinarian_id -> Nullable<Uuid>,
        appointment_date -> Timestamptz,
        appointment_type -> Text,
        status -> Text,
        notes -> Nullable<Text>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    customer (id) {
        id -> Uuid,
        name -> Text,
        email -> Text,
        phone -> Text,
        address -> Nullable<Text>,
        is_active -> Bool,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    pet (id) {
        id -> Uuid,
        customer_id -> Uuid,
        name -> Text,
        species -> Text,
        breed -> Nullable<Text>,
        age -> Nullable<Int4>,
        weight -> Nullable<Text>,
        gender -> Nullable<Text>,
        microchip -> Nullable<Text>,
        is_active -> Bool,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    app_user (id) {
        id -> Uuid,
        name -> Text,
        email -> Text,
        role -> Text,
        phone -> Nullable<Text>,
        is_active -> Bool,
        created_at -> Timestamptz,
    }
}

diesel::allow_tables_to_appear_in_same_query!(appointment, customer, pet, app_user);
