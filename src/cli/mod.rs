//! Operator console for the identity/administration core: an interactive
//! interpreter over the same flows the dashboard shell drives (sign-in, guest
//! fallback, researcher verification, role management).

use std::io::{self, Write};
use std::sync::Arc;

use anyhow::Result;

use crate::admin::{self, ProfileSaveOutcome};
use crate::backend::SignUpOutcome;
use crate::config::Config;
use crate::identity::{is_admin, LocalCache, Profile, ProfileRole, SessionResolver, SessionStore};
use crate::orcid::OrcidClient;

fn print_usage() {
    eprintln!(
        "Commands:\n  login <email> <password>        sign in against the durable backend\n  signup <name> <email> <password> create an account (may require email confirmation)\n  guest                            continue as a local guest (no backend)\n  logout                           clear the local session and invalidate server-side\n  whoami                           show the currently resolved user\n  verify <orcid>                   verify a researcher identifier\n  users                            list profiles (admin)\n  promote <user-id>                grant admin to a target user (admin)\n  demote <user-id>                 revoke admin from a target user (admin)\n  set-orcid <user-id> <orcid>      persist an ORCID iD on a target profile (admin)\n  help                             show this help\n  quit | exit                      leave the console"
    );
}

fn print_profiles(profiles: &[Profile]) {
    println!("{:<38} {:<6} {:<20} {}", "id", "role", "orcid", "name <email>");
    for p in profiles {
        println!(
            "{:<38} {:<6} {:<20} {} <{}>",
            p.id,
            p.role.as_str(),
            p.orcid.as_deref().unwrap_or("-"),
            p.full_name,
            p.email
        );
    }
    println!("rows: {}", profiles.len());
}

/// Run the interactive console until quit/EOF.
pub fn run(cfg: Config) -> Result<()> {
    let rt = tokio::runtime::Runtime::new()?;
    let backend = cfg.backend();
    let cache = LocalCache::new(&cfg.data_dir);
    let store = Arc::new(SessionStore::new());
    let resolver = SessionResolver::new(backend.clone(), cache, store.clone());
    resolver.bootstrap();
    let orcid = OrcidClient::new();

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut input = String::new();
    println!("atelier console. Type 'help' for commands.");
    loop {
        input.clear();
        print!("> ");
        let _ = stdout.flush();
        if stdin.read_line(&mut input).is_err() {
            break;
        }
        if input.is_empty() {
            // EOF
            break;
        }
        let line = input.trim();
        if line.is_empty() {
            continue;
        }
        let parts: Vec<&str> = line.split_whitespace().collect();
        match parts[0] {
            "help" => print_usage(),
            "quit" | "exit" => break,
            "whoami" => match store.current() {
                Some(u) => println!("{} <{}> role={}", u.name, u.email, u.role.as_str()),
                None => println!("not signed in"),
            },
            "login" => {
                if parts.len() < 3 {
                    eprintln!("usage: login <email> <password>");
                    continue;
                }
                match rt.block_on(resolver.sign_in_with_password(parts[1], parts[2])) {
                    Ok(()) => println!("signed in"),
                    Err(e) => eprintln!("sign-in failed: {}", e),
                }
            }
            "signup" => {
                if parts.len() < 4 {
                    eprintln!("usage: signup <name> <email> <password>");
                    continue;
                }
                match rt.block_on(resolver.sign_up(parts[1], parts[2], parts[3])) {
                    Ok(SignUpOutcome::SignedIn(_)) => println!("account created and signed in"),
                    Ok(SignUpOutcome::ConfirmationRequired) => {
                        println!("account created; confirm the email address to sign in")
                    }
                    Err(e) => eprintln!("sign-up failed: {}", e),
                }
            }
            "guest" => {
                let guest = resolver.login_as_guest();
                println!("continuing as {} (role={})", guest.name, guest.role.as_str());
            }
            "logout" => {
                rt.block_on(resolver.logout());
                println!("signed out");
            }
            "verify" => {
                if parts.len() < 2 {
                    eprintln!("usage: verify <orcid>");
                    continue;
                }
                match rt.block_on(orcid.verify(parts[1])) {
                    Ok(name) => println!("verified: {}", name),
                    Err(e) => eprintln!("{}", e.message()),
                }
            }
            "users" | "promote" | "demote" | "set-orcid" => {
                // Admin-only controls consult the single gate predicate.
                if !is_admin(store.current().as_ref()) {
                    eprintln!("admin privileges required");
                    continue;
                }
                match parts[0] {
                    "users" => match rt.block_on(admin::fetch_profiles(backend.as_ref())) {
                        Ok(profiles) => print_profiles(&profiles),
                        Err(e) => eprintln!("error fetching users: {}", e.message()),
                    },
                    "promote" | "demote" => {
                        if parts.len() < 2 {
                            eprintln!("usage: {} <user-id>", parts[0]);
                            continue;
                        }
                        let new_role = if parts[0] == "promote" {
                            ProfileRole::Admin
                        } else {
                            ProfileRole::User
                        };
                        match rt.block_on(admin::change_role(backend.as_ref(), parts[1], new_role))
                        {
                            Ok(()) => println!("role updated; run 'users' to re-read"),
                            Err(e) => eprintln!("role update failed: {}", e.message()),
                        }
                    }
                    "set-orcid" => {
                        if parts.len() < 3 {
                            eprintln!("usage: set-orcid <user-id> <orcid>");
                            continue;
                        }
                        match rt.block_on(admin::save_profile_orcid(
                            backend.as_ref(),
                            parts[1],
                            parts[2],
                        )) {
                            Ok(ProfileSaveOutcome::Saved) => println!("profile updated"),
                            Ok(ProfileSaveOutcome::SavedAndElevated) => {
                                println!("profile updated; admin role granted")
                            }
                            Ok(ProfileSaveOutcome::SavedRoleGrantFailed { error }) => {
                                eprintln!(
                                    "profile updated, but the role grant failed: {}",
                                    error.message()
                                )
                            }
                            Err(e) => eprintln!("profile update failed: {}", e.message()),
                        }
                    }
                    _ => unreachable!(),
                }
            }
            _ => eprintln!("unknown command; type 'help'"),
        }
    }
    Ok(())
}
