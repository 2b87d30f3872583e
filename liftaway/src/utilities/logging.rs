use std::io::Write;

use env_logger::{Builder, Env};

pub fn init_logger() {
    let mut builder =
        Builder::from_env(Env::default().default_filter_or("liftaway=info,shared_resources=info"));

    builder.format(|buf, record| {
        let module_path = record.module_path().unwrap_or("<unknown>");
        writeln!(
            buf,
            "[{}][{}][{}] {}",
            buf.timestamp_millis(),
            record.level(),
            module_path,
            record.args()
        )
    });

    let _ = builder.try_init();
}
