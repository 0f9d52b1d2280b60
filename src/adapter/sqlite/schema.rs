diesel::table! {
    fills (id) {
        id -> Nullable<Integer>,
        timestamp -> Text,
        address -> Text,
        coin -> Text,
        side -> Text,
        size -> Double,
        price -> Double,
        direction -> Nullable<Text>,
        tx_hash -> Text,
        fee -> Double,
        fee_token -> Text,
        start_position -> Double,
        closed_pnl -> Nullable<Double>,
        created_at -> Text,
    }
}

diesel::table! {
    order_events (id) {
        id -> Nullable<Integer>,
        timestamp -> Text,
        address -> Text,
        coin -> Text,
        action -> Text,
        side -> Text,
        size -> Double,
        price -> Double,
        order_id -> BigInt,
        created_at -> Text,
    }
}

diesel::allow_tables_to_appear_in_same_query!(fills, order_events,);
