use std::{error::Error, fs, path::Path};

use qtab::{
    gym::FrozenLake,
    stats::{success_rate, TrainingSummary},
    Evaluator, Trainer, TrainingConfig,
};

const EVAL_EPISODES: u32 = 5;
const EVAL_MAX_STEPS: u32 = 100;

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let out = Path::new("demos/out");
    fs::create_dir_all(out)?;

    let mut env = FrozenLake::new();
    let mut trainer = Trainer::new(TrainingConfig::default(), &env)?;
    println!(
        "{} states, {} actions",
        trainer.q_table().n_states(),
        trainer.q_table().n_actions()
    );

    trainer.train_unseeded(&mut env)?;
    let records = trainer.records();

    let mut wtr = csv::Writer::from_path(out.join("episodes.csv"))?;
    wtr.write_record(["episode", "total_reward", "epsilon", "steps"])?;
    for r in records {
        wtr.write_record(&[
            r.episode.to_string(),
            r.total_reward.to_string(),
            r.epsilon.to_string(),
            r.steps.to_string(),
        ])?;
    }
    wtr.flush()?;

    let table = trainer.q_table();
    let mut wtr = csv::Writer::from_path(out.join("q_table.csv"))?;
    let mut header = vec![String::from("state")];
    header.extend((0..table.n_actions()).map(|a| format!("a{a}")));
    wtr.write_record(&header)?;
    for (state, row) in table.as_slice().chunks(table.n_actions()).enumerate() {
        let mut fields = vec![state.to_string()];
        fields.extend(row.iter().map(|v| v.to_string()));
        wtr.write_record(&fields)?;
    }
    wtr.flush()?;

    let summary = TrainingSummary::from_records(records);
    let report = format!("{:#?}\n\n{summary:#?}\n\n{table}", trainer.config());
    fs::write(out.join("statistics.txt"), &report)?;
    println!("{report}");

    let outcomes =
        Evaluator::new(trainer.q_table()).evaluate(&mut env, EVAL_EPISODES, EVAL_MAX_STEPS)?;
    for (i, outcome) in outcomes.iter().enumerate() {
        if outcome.success {
            println!("episode {}: reached the goal in {} steps", i + 1, outcome.steps_taken);
        } else {
            println!("episode {}: did not reach the goal", i + 1);
        }
    }
    println!("success rate: {:.0}%", success_rate(&outcomes) * 100.0);

    Ok(())
}
