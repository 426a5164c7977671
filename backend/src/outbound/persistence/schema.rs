//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match `backend/migrations` exactly. When a
//! migration changes the schema, regenerate them with `diesel print-schema`
//! or update them by hand.

diesel::table! {
    /// Registered users.
    users (id) {
        id -> Uuid,
        /// Login handle, unique, at most 32 characters.
        username -> Varchar,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Role, balance and contact details; one row per user.
    profiles (user_id) {
        user_id -> Uuid,
        /// `citizen`, `collector` or `recycler`.
        role -> Varchar,
        /// Running balance; `CHECK (points >= 0)`.
        points -> Int8,
        document -> Nullable<Varchar>,
        phone -> Nullable<Varchar>,
    }
}

diesel::table! {
    /// Reported waste items.
    residues (id) {
        id -> Uuid,
        citizen_id -> Uuid,
        residue_type -> Varchar,
        weight_kg -> Nullable<Float8>,
        units -> Nullable<Int4>,
        notes -> Nullable<Varchar>,
        status -> Varchar,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Pickup tasks, one per residue.
    collections (id) {
        id -> Uuid,
        residue_id -> Uuid,
        citizen_id -> Uuid,
        collector_id -> Nullable<Uuid>,
        status -> Varchar,
        latitude -> Float8,
        longitude -> Float8,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
        processed_at -> Nullable<Timestamptz>,
    }
}

diesel::table! {
    /// Append-only points ledger.
    points_transactions (id) {
        id -> Uuid,
        user_id -> Uuid,
        points -> Int8,
        description -> Varchar,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Reward catalogue.
    rewards (id) {
        id -> Uuid,
        name -> Varchar,
        description -> Nullable<Text>,
        cost -> Int8,
        active -> Bool,
    }
}

diesel::table! {
    /// Append-only redemption records.
    user_rewards (id) {
        id -> Uuid,
        user_id -> Uuid,
        reward_id -> Uuid,
        redeemed_at -> Timestamptz,
    }
}

diesel::joinable!(profiles -> users (user_id));
diesel::joinable!(residues -> users (citizen_id));
diesel::joinable!(collections -> residues (residue_id));
diesel::joinable!(points_transactions -> users (user_id));
diesel::joinable!(user_rewards -> rewards (reward_id));

diesel::allow_tables_to_appear_in_same_query!(
    users,
    profiles,
    residues,
    collections,
    points_transactions,
    rewards,
    user_rewards,
);
