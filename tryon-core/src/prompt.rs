//! Instructions sent to the image model alongside the input images.
//!
//! The wording is product configuration rather than an engineering contract;
//! the only structural guarantee is that the pose prompt embeds the
//! requested pose verbatim.

/// Turns an uploaded photo into a neutral, full-body studio avatar.
pub const MODEL_PROMPT: &str = "You are an AI fashion model generator. Your task is to create a professional fashion model photo from the person in this image.

CRITICAL REQUIREMENTS:
1. BODY & IDENTITY: Preserve the person's exact facial features, skin tone, hair, body shape, and proportions. Keep their natural appearance intact.
2. POSE: Place them in a straight, relaxed standing pose with arms naturally at their sides or slightly away from the body. The pose must be neutral and suitable for showing clothing.
3. FRAMING: Generate a full-body shot from head to toe. Ensure the entire body is visible including feet. The person should be centered in the frame.
4. BACKGROUND: Use a clean, solid light gray studio background (#f0f0f0). No shadows, textures, or distractions.
5. LIGHTING: Apply professional, even studio lighting without harsh shadows. The lighting should be bright and flattering.
6. EXPRESSION: Neutral, calm, confident expression. Professional model demeanor.
7. QUALITY: The output must be photorealistic, high-resolution, and look like a professional e-commerce fashion photograph.
8. CLOTHING: Keep their current clothing unchanged for now.

Return ONLY the generated image with no text or annotations.";

/// Dresses the avatar (first image) in the garment (second image).
pub const TRY_ON_PROMPT: &str = "You are an expert virtual try-on AI system. You will receive TWO images:
1. MODEL IMAGE: A person in a fashion photo
2. GARMENT IMAGE: A clothing item to be worn

Your task: Create a photorealistic image showing the person wearing the new garment.

CRITICAL INSTRUCTIONS:

**GARMENT APPLICATION:**
- COMPLETELY REMOVE the original clothing from the model
- REPLACE it with the garment from the second image
- The new garment must fit naturally on the person's body
- Preserve all details of the new garment: color, pattern, texture, style, design elements
- NO traces of the original clothing should remain visible
- Ensure proper draping, wrinkles, and fabric behavior based on the pose

**PRESERVE EXACTLY:**
- Person's face, facial features, and expression
- Hair style and color
- Skin tone and body shape
- Body proportions and posture
- The exact pose and stance
- The entire background without any changes
- Lighting conditions and shadows

**TECHNICAL REQUIREMENTS:**
- The garment must adapt realistically to the person's pose
- Add natural shadows and highlights where the fabric would create them
- Ensure the garment fits the body properly (not too tight or loose)
- Maintain photorealistic quality throughout
- The lighting on the garment should match the scene lighting
- Edges and transitions should be seamless

**OUTPUT:**
Return ONLY the final composite image. No text, labels, or annotations.

The result must look like the person is genuinely wearing the new garment in a professional fashion photograph.";

/// Re-poses a try-on result, keeping identity, garment and background.
pub fn pose_prompt(pose_instruction: &str) -> String {
    format!(
        "You are an AI fashion photographer. Recreate this fashion photograph with a different pose/angle.

NEW POSE REQUESTED: {pose}

CRITICAL REQUIREMENTS:
1. PRESERVE IDENTITY: Keep the person's face, facial features, skin tone, hair, and body exactly the same
2. PRESERVE CLOTHING: Keep the exact same garment with all its colors, patterns, textures, and design details
3. PRESERVE BACKGROUND: Maintain the same background style and studio setting
4. CHANGE POSE: Adjust the person's pose/stance/body position to match: \"{pose}\"
5. NATURAL MOVEMENT: Ensure the new pose looks natural and the clothing drapes realistically
6. LIGHTING: Adjust lighting naturally for the new angle while maintaining studio quality
7. QUALITY: Maintain photorealistic quality as if this was a professional fashion shoot from a different angle

Return ONLY the final image showing the same person in the same outfit but in the new pose.",
        pose = pose_instruction
    )
}
