// handlers/mod.rs - Two handler tiers
//
// Public (no bearer token) → Protected (bearer token resolved to a local user)

pub mod public;    // /api/health, /api/users/register, /api/users/sync-supabase
pub mod protected; // /api/users/me, /api/materials/*, /api/chat/*
