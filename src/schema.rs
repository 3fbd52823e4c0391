// Tables shared with the rest of the booking platform. Bookings are expected
// to carry a unique index on (ground_id, booking_date, start_time).

diesel::table! {
    grounds (id) {
        id -> Uuid,
        name -> Text,
        price_per_hour -> Int8,
        weekday_hours -> Text,
        weekend_hours -> Text,
    }
}

diesel::table! {
    bookings (id) {
        id -> Uuid,
        ground_id -> Uuid,
        booking_date -> Date,
        start_time -> Time,
        end_time -> Time,
        status -> Text,
        total_price -> Int8,
    }
}

diesel::joinable!(bookings -> grounds (ground_id));
diesel::allow_tables_to_appear_in_same_query!(grounds, bookings);
