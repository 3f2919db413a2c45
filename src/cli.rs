/// CLI argument parsing and help text

pub fn print_help() {
    let version = env!("CARGO_PKG_VERSION");
    println!("TTS Reader Server v{}", version);
    println!("Async text-to-speech generation server fronting multiple cloud TTS providers");
    println!();
    println!("USAGE:");
    println!("    tts_reader_server [OPTIONS]");
    println!();
    println!("OPTIONS:");
    println!("    -h, --help            Print this help message");
    println!("    -v, --version         Print version information");
    println!();
    println!("SERVER ENDPOINTS:");
    println!("    GET    /providers              - List supported TTS providers");
    println!("    POST   /voices                 - List voices for a provider");
    println!("    POST   /generate               - Start an async speech generation job");
    println!("    GET    /generate/{{id}}/status   - Poll job status/progress");
    println!("    GET    /audio/{{id}}             - Fetch generated audio metadata");
    println!("    GET    /audio/{{id}}/file        - Download the generated MP3");
    println!("    GET    /settings                - View which providers have credentials");
    println!("    PUT    /settings                - Set a provider's API key at runtime");
    println!("    GET    /health                  - Health check");
    println!();
    println!("ENVIRONMENT VARIABLES:");
    println!("    HOST                              - Bind address (default: 0.0.0.0)");
    println!("    PORT                              - Bind port (default: 8080)");
    println!("    AUDIO_STORAGE_DIR                 - Directory for generated audio (default: ./audio)");
    println!("    GOOGLE_CREDENTIALS_PATH           - Path to Google service account JSON");
    println!("    GOOGLE_API_KEY                    - Google Cloud TTS API key");
    println!("    AWS_ACCESS_KEY_ID                 - Amazon Polly access key");
    println!("    AWS_SECRET_ACCESS_KEY             - Amazon Polly secret key");
    println!("    AWS_REGION                        - Amazon Polly region (default: us-east-1)");
    println!("    ELEVENLABS_API_KEY                - ElevenLabs API key");
    println!("    OPENAI_API_KEY                    - OpenAI API key");
    println!("    TTS_API_KEY_FILE                  - Path to server API keys file");
    println!(
        "    RATE_LIMIT_MODE                   - Rate limit mode (auto/per-key/per-ip/disabled)"
    );
    println!("    REQUEST_TIMEOUT_SECONDS           - Request timeout in seconds (default: 60)");
    println!("    LOG_LEVEL, RUST_LOG               - Log level (error/warn/info/debug/trace)");
    println!();
    println!("CONFIGURATION:");
    println!("    Settings can be configured via a .env file in the current working");
    println!("    directory, or via provider credentials set at runtime through");
    println!("    PUT /settings (kept in memory only, lost on restart).");
}

pub fn print_version() {
    println!("TTS Reader Server v{}", env!("CARGO_PKG_VERSION"));
}
