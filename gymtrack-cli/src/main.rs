use std::fmt;
use std::str::FromStr;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use dotenvy::dotenv;
use log::warn;

use gymtrack::GymError;
use gymtrack::config::Config;
use gymtrack::db::models::Workout;
use gymtrack::db::{
    DEFAULT_HISTORY_LIMIT, DEFAULT_LEADERBOARD_LIMIT, MongoWorkoutStore, PgProfileStore,
    ProfileStore, WorkoutStore,
};
use gymtrack::leaderboard::{Standings, leaderboard};
use gymtrack::logging::set_log_level;
use gymtrack::seed::{SeedPlan, seed};
use gymtrack::session::{DEFAULT_GYM, Session, require_users};

#[derive(Parser, Debug)]
#[command(version, about = "GymTrack - workout log and leaderboard", long_about = None)]
struct Args {
    /// off, error, warn, info, debug or trace
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

/// One exercise entry written as `NAME:SETSxREPS@KG`, e.g. `Squat:3x10@60`.
#[derive(Debug, Clone, PartialEq)]
struct ExerciseArg {
    name: String,
    sets: i32,
    reps: i32,
    weight_kg: f64,
}

impl FromStr for ExerciseArg {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let usage = || format!("'{}' should look like NAME:SETSxREPS@KG", s);
        let (name, load) = s.rsplit_once(':').ok_or_else(usage)?;
        let (scheme, weight) = load.split_once('@').ok_or_else(usage)?;
        let (sets, reps) = scheme.split_once(['x', 'X']).ok_or_else(usage)?;

        Ok(Self {
            name: name.to_string(),
            sets: sets.trim().parse().map_err(|_| usage())?,
            reps: reps.trim().parse().map_err(|_| usage())?,
            weight_kg: weight
                .trim()
                .trim_end_matches("kg")
                .parse()
                .map_err(|_| usage())?,
        })
    }
}

impl fmt::Display for ExerciseArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}x{}@{}",
            self.name, self.sets, self.reps, self.weight_kg
        )
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List the users that can be selected
    Users,
    /// Recent workouts, newest first
    History {
        #[arg(short, long)]
        user: i32,
        #[arg(short, long, default_value_t = DEFAULT_HISTORY_LIMIT)]
        limit: usize,
    },
    /// Every workout of a user with its id
    Workouts {
        #[arg(short, long)]
        user: i32,
    },
    /// Show one workout in full
    Show {
        #[arg(short, long)]
        user: i32,
        id: String,
    },
    /// Sessions where an exercise was done at or above a weight
    Heavy {
        #[arg(short, long)]
        user: i32,
        #[arg(short, long, default_value = "Bench Press")]
        exercise: String,
        #[arg(short, long, default_value_t = 80.0)]
        min_weight: f64,
    },
    /// Search gym names and notes
    Search {
        #[arg(short, long)]
        user: i32,
        term: String,
    },
    /// Top athletes by total volume
    Leaderboard {
        #[arg(short, long, default_value_t = DEFAULT_LEADERBOARD_LIMIT)]
        limit: usize,
    },
    /// Log a new session from one or more exercises
    Log {
        #[arg(short, long)]
        user: i32,
        #[arg(short, long, default_value = DEFAULT_GYM)]
        gym: String,
        #[arg(short, long)]
        notes: Option<String>,
        /// NAME:SETSxREPS@KG, repeatable
        #[arg(short, long = "exercise", required = true)]
        exercises: Vec<ExerciseArg>,
    },
    /// Delete a workout by id
    Delete {
        #[arg(short, long)]
        user: i32,
        id: String,
    },
    /// Change the country on a user's profile
    SetCountry {
        #[arg(short, long)]
        user: i32,
        country: String,
    },
    /// Recreate both databases with generated demo data
    Seed {
        #[arg(long, default_value_t = SeedPlan::default().users)]
        users: usize,
        #[arg(long, default_value_t = SeedPlan::default().workouts)]
        workouts: usize,
    },
}

struct Stores {
    config: Config,
    profiles: PgProfileStore,
    workouts: MongoWorkoutStore,
}

impl Stores {
    async fn open() -> Result<Self> {
        let config = Config::from_env()?;
        let profiles = PgProfileStore::connect_lazy(&config.postgres);
        let workouts = MongoWorkoutStore::connect(&config.mongo_uri, &config.mongo_database).await?;
        Ok(Self {
            config,
            profiles,
            workouts,
        })
    }

    fn postgres_hint(&self) -> String {
        format!(
            "make sure PostgreSQL is running on {}:{}",
            self.config.postgres.host, self.config.postgres.port
        )
    }

    async fn session(self, user_id: i32) -> Result<Session<PgProfileStore, MongoWorkoutStore>> {
        let hint = self.postgres_hint();
        Session::open(self.profiles, self.workouts, user_id)
            .await
            .map_err(|e| with_hint(e, hint))
    }
}

fn with_hint(e: GymError, hint: String) -> anyhow::Error {
    if e.is_store_failure() {
        anyhow::Error::new(e).context(hint)
    } else {
        e.into()
    }
}

/// The leaderboard, refused with the setup message while no users exist.
async fn standings<P: ProfileStore, W: WorkoutStore>(
    profiles: &P,
    workouts: &W,
    limit: usize,
) -> gymtrack::Result<Standings> {
    require_users(profiles).await?;
    leaderboard(profiles, workouts, limit).await
}

fn print_workout_table(workouts: &[Workout]) {
    println!("{:<26} {:<12} {:<22} {:>10}", "ID", "DATE", "GYM", "VOLUME KG");
    for w in workouts {
        println!(
            "{:<26} {:<12} {:<22} {:>10}",
            w.id.map(|id| id.to_hex()).unwrap_or_default(),
            w.date.format("%Y-%m-%d"),
            w.gym_name,
            w.total_volume_kg
        );
    }
}

fn print_workout(workout: &Workout) {
    println!("{}", workout);
    for (idx, exercise) in workout.exercises.iter().enumerate() {
        println!("  [{}] {}", idx + 1, exercise);
    }
    if let Some(duration) = workout.duration_min {
        println!("  Duration: {} min", duration);
    }
    if let Some(notes) = &workout.notes {
        println!("  Notes: {}", notes);
    }
}

async fn run(command: Commands) -> Result<()> {
    let stores = Stores::open().await?;

    match command {
        Commands::Users => {
            let hint = stores.postgres_hint();
            let users = require_users(&stores.profiles)
                .await
                .map_err(|e| with_hint(e, hint))?;
            for user in users {
                println!("{:>5}  {}", user.user_id, user.label());
            }
        }
        Commands::History { user, limit } => {
            let session = stores.session(user).await?;
            let workouts = session.history(limit).await?;
            if workouts.is_empty() {
                println!("No workouts logged yet.");
            } else {
                println!("Recent history for {}", session.user().username);
                print_workout_table(&workouts);
            }
        }
        Commands::Workouts { user } => {
            let session = stores.session(user).await?;
            let labels = session.workout_labels().await?;
            if labels.is_empty() {
                println!("No workouts found.");
            }
            for label in labels {
                println!("{}  {}", label.id.to_hex(), label);
            }
        }
        Commands::Show { user, id } => {
            let session = stores.session(user).await?;
            match session.workout(&id).await? {
                Some(workout) => print_workout(&workout),
                None => println!("No workout with id {}.", id),
            }
        }
        Commands::Heavy {
            user,
            exercise,
            min_weight,
        } => {
            let session = stores.session(user).await?;
            println!("Sessions with {} >= {}kg", exercise, min_weight);
            let hits = session.heavy_sets(&exercise, min_weight).await?;
            if hits.is_empty() {
                println!("No matches found.");
            }
            for hit in hits {
                println!("{}", hit);
            }
        }
        Commands::Search { user, term } => {
            let session = stores.session(user).await?;
            println!("Results for '{}'", term);
            let found = session.search(&term).await?;
            if found.is_empty() {
                println!("No results found.");
            }
            for w in found {
                println!(
                    "{}  {}  {}",
                    w.date.format("%Y-%m-%d"),
                    w.gym_name,
                    w.notes.as_deref().unwrap_or("")
                );
            }
        }
        Commands::Leaderboard { limit } => {
            let hint = stores.postgres_hint();
            match standings(&stores.profiles, &stores.workouts, limit)
                .await
                .map_err(|e| with_hint(e, hint))
                .context("Error fetching leaderboard")?
            {
                Standings::NoData => println!("No workout data available."),
                Standings::Ranked(rows) => {
                    println!(
                        "{:>4}  {:<24} {:<10} {:>12} {:>8}",
                        "RANK", "ATHLETE", "COUNTRY", "VOLUME KG", "SESSIONS"
                    );
                    for row in rows {
                        println!(
                            "{:>4}  {:<24} {:<10} {:>12} {:>8}",
                            row.rank,
                            row.athlete,
                            row.country.as_deref().unwrap_or("-"),
                            row.volume_kg,
                            row.sessions
                        );
                    }
                }
            }
        }
        Commands::Log {
            user,
            gym,
            notes,
            exercises,
        } => {
            let mut session = stores.session(user).await?;
            for e in &exercises {
                session
                    .add_exercise(&e.name, e.sets, e.reps, e.weight_kg)
                    .with_context(|| format!("Could not add {}", e))?;
            }
            for exercise in session.buffer().exercises() {
                println!("  {}", exercise);
            }
            let saved = session
                .save_workout(&gym, notes.as_deref())
                .await
                .context("Error saving workout")?;
            println!(
                "Workout saved! {}kg total ({})",
                saved.total_volume_kg,
                saved.id.map(|id| id.to_hex()).unwrap_or_default()
            );
        }
        Commands::Delete { user, id } => {
            let session = stores.session(user).await?;
            if session
                .delete_workout(&id)
                .await
                .context("Error deleting workout")?
            {
                println!("Workout deleted.");
            } else {
                println!("No workout with id {}; nothing deleted.", id);
            }
        }
        Commands::SetCountry { user, country } => {
            let mut session = stores.session(user).await?;
            session
                .update_country(&country)
                .await
                .context("Error updating country")?;
            println!("Country updated to {}!", country);
        }
        Commands::Seed { users, workouts } => {
            let plan = SeedPlan { users, workouts };
            let mut rng = rand::rng();
            let report = seed(&stores.profiles, &stores.workouts, plan, &mut rng).await?;
            println!("Setup complete!");
            println!("PostgreSQL: {} users created", report.users);
            println!("MongoDB: {} workouts created", report.workouts);
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    let args = Args::parse();

    if !set_log_level(&args.log_level) {
        set_log_level("warn");
        warn!("unknown log level {}, using warn", args.log_level);
    }

    run(args.command).await
}
